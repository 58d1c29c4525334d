use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::WorldBounds;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub init_boids: usize,
    /// boids and the predator spawn uniformly in [-spawn_half_extent, spawn_half_extent)^3
    pub spawn_half_extent: f32,
    pub predator_on: bool,
    /// `None` seeds the simulation from entropy
    pub seed: Option<u64>,

    /// integration step, position += direction * step_size
    pub step_size: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// interpolate speed by proximity to the closest threat, otherwise a plain clamp
    pub speed_modulation_on: bool,

    pub separation_radius: f32,
    pub separation_strength: f32,

    pub cohesion_radius: f32,
    /// Weight of the pull toward the local centre of mass.
    ///
    /// The tuning surface has always called this knob "alignment", it is kept
    /// under that name. Heading matching has its own weight,
    /// [`RunOptions::velocity_matching_weight`].
    pub alignment_weight: f32,
    pub velocity_matching_weight: f32,

    pub predator_avoid_radius: f32,
    pub predator_avoid_strength: f32,
    /// steer the predator toward its nearest boid, 0 leaves it wandering
    pub predator_pursuit_weight: f32,

    pub orientation_blend: f32,
    /// model axis that should point along the heading
    pub reference_axis: Vec3,

    pub bounds: WorldBounds,
    pub boundary: Boundary,
    pub update_mode: UpdateMode,
}

/// Knobs exposed to a tuning UI, see [`RunOptions::tune`]
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct TuningKnobs {
    /// separation radius
    pub separation: f32,
    /// cohesion radius
    pub cohesion: f32,
    /// centring weight, [`RunOptions::alignment_weight`]
    pub alignment: f32,
    /// maximum speed
    pub speed: f32,
}

impl TuningKnobs {
    pub const SEPARATION_RANGE: (f32, f32) = (0.1, 3.);
    pub const COHESION_RANGE: (f32, f32) = (0.1, 5.);
    pub const ALIGNMENT_RANGE: (f32, f32) = (-1., 1.);
    pub const SPEED_RANGE: (f32, f32) = (0.1, 5.);

    /// the knobs clamped to their slider ranges
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32, (lo, hi): (f32, f32)| v.clamp(lo, hi);

        TuningKnobs {
            separation: clamp(self.separation, Self::SEPARATION_RANGE),
            cohesion: clamp(self.cohesion, Self::COHESION_RANGE),
            alignment: clamp(self.alignment, Self::ALIGNMENT_RANGE),
            speed: clamp(self.speed, Self::SPEED_RANGE),
        }
    }
}

impl RunOptions {
    /// Applies knob values coming from a tuning UI, clamped to their ranges.
    ///
    /// Lowers `min_speed` when the new maximum would fall below it.
    pub fn tune(&mut self, knobs: TuningKnobs) {
        let knobs = knobs.clamped();

        self.separation_radius = knobs.separation;
        self.cohesion_radius = knobs.cohesion;
        self.alignment_weight = knobs.alignment;
        self.max_speed = knobs.speed;
        self.min_speed = self.min_speed.min(self.max_speed);
    }

    pub fn knobs(&self) -> TuningKnobs {
        TuningKnobs {
            separation: self.separation_radius,
            cohesion: self.cohesion_radius,
            alignment: self.alignment_weight,
            speed: self.max_speed,
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.init_boids == 0 {
            return Err(OptionsError::NoBoids);
        }

        if !(self.min_speed >= 0. && self.min_speed <= self.max_speed) {
            return Err(OptionsError::SpeedRange {
                min: self.min_speed,
                max: self.max_speed,
            });
        }

        for (name, value) in [
            ("step_size", self.step_size),
            ("separation_radius", self.separation_radius),
            ("cohesion_radius", self.cohesion_radius),
            ("predator_avoid_radius", self.predator_avoid_radius),
            ("spawn_half_extent", self.spawn_half_extent),
        ] {
            if !(value > 0.) {
                return Err(OptionsError::NonPositive { name, value });
            }
        }

        if !self.bounds.half_extents.cmpgt(Vec3::ZERO).all() {
            return Err(OptionsError::Bounds(self.bounds.half_extents));
        }

        if !self.bounds.contains(Vec3::splat(self.spawn_half_extent)) {
            return Err(OptionsError::SpawnOutsideBounds {
                spawn: self.spawn_half_extent,
                bounds: self.bounds.half_extents,
            });
        }

        if !(0. ..=1.).contains(&self.orientation_blend) {
            return Err(OptionsError::Blend(self.orientation_blend));
        }

        if self.reference_axis.try_normalize().is_none() {
            return Err(OptionsError::ReferenceAxis);
        }

        match self.boundary {
            Boundary::Reflective {
                near_threshold,
                probe_length,
            } if !(near_threshold > 0. && near_threshold <= probe_length) => {
                Err(OptionsError::Probe {
                    near_threshold,
                    probe_length,
                })
            }
            Boundary::Clamp { jitter } if !(jitter >= 0.) => Err(OptionsError::NonPositive {
                name: "jitter",
                value: jitter,
            }),
            _ => Ok(()),
        }
    }

    /// how far ahead boids look for walls when modulating their speed
    pub fn probe_length(&self) -> f32 {
        match self.boundary {
            Boundary::Reflective { probe_length, .. } => probe_length,
            Boundary::Clamp { .. } => DEFAULT_PROBE_LENGTH,
        }
    }
}

pub const DEFAULT_NEAR_THRESHOLD: f32 = 10.;
pub const DEFAULT_PROBE_LENGTH: f32 = 15.;

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            init_boids: 50,
            spawn_half_extent: 5.,
            predator_on: true,
            seed: None,
            step_size: 0.1,
            min_speed: 0.01,
            max_speed: 0.1,
            speed_modulation_on: true,
            separation_radius: 0.5,
            separation_strength: 2.,
            cohesion_radius: 1.,
            alignment_weight: 0.25,
            velocity_matching_weight: 2.,
            predator_avoid_radius: 7.,
            predator_avoid_strength: 2.,
            predator_pursuit_weight: 0.,
            orientation_blend: 0.1,
            reference_axis: Vec3::Y,
            bounds: WorldBounds::default(),
            boundary: Boundary::Reflective {
                near_threshold: DEFAULT_NEAR_THRESHOLD,
                probe_length: DEFAULT_PROBE_LENGTH,
            },
            update_mode: UpdateMode::Deferred,
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
// {"type": "Reflective", "near_threshold": 10, "probe_length": 15}
pub enum Boundary {
    /// reflect the heading about the wall normal once a wall ahead is closer than `near_threshold`
    Reflective { near_threshold: f32, probe_length: f32 },
    /// flip the heading on any axis past the bounds, plus uniform noise in [-jitter, jitter)
    Clamp { jitter: f32 },
}

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
// {"type": "Immediate"}
pub enum UpdateMode {
    /// every boid steers off the previous tick's state
    Deferred,
    /// boids are moved in order, later boids see earlier boids' new state
    Immediate,
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("the flock needs at least one boid")]
    NoBoids,
    #[error("invalid speed range [{min}, {max}]")]
    SpeedRange { min: f32, max: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("world half extents must be positive, got {0}")]
    Bounds(Vec3),
    #[error("spawn cube ±{spawn} does not fit in the world ±{bounds}")]
    SpawnOutsideBounds { spawn: f32, bounds: Vec3 },
    #[error("orientation blend must lie in [0, 1], got {0}")]
    Blend(f32),
    #[error("reference axis must not be zero")]
    ReferenceAxis,
    #[error("near threshold {near_threshold} must be positive and within the probe length {probe_length}")]
    Probe {
        near_threshold: f32,
        probe_length: f32,
    },
}

use std::ops::Add;

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    math_helpers::{away_from, lerp_speed, safe_normalize, smooth_orientation, Reflect},
    options::{Boundary, RunOptions},
};

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum BoidRole {
    Mob,
    Predator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    // sequential id starting from 0, the predator takes the next free one
    pub id: usize,
    pub role: BoidRole,
    pub position: Vec3,
    /// heading, unit length in between ticks
    pub direction: Vec3,
    /// smoothed heading for display only
    pub orientation: Quat,
    /// length of the direction right after the last speed limiting
    pub speed: f32,
}

/// Direction change one agent proposes for the current tick, plus how close
/// the nearest thing it should keep clear of is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub delta: Vec3,
    /// nearest neighbour, predator or wall ahead, `f32::INFINITY` if none
    pub closest: f32,
}

impl Steering {
    pub const NONE: Steering = Steering {
        delta: Vec3::ZERO,
        closest: f32::INFINITY,
    };
}

impl Add for Steering {
    type Output = Steering;

    fn add(self, other: Steering) -> Steering {
        Steering {
            delta: self.delta + other.delta,
            closest: self.closest.min(other.closest),
        }
    }
}

impl Default for Steering {
    fn default() -> Self {
        Steering::NONE
    }
}

impl Boid {
    /// Creates a new [`Boid`].
    pub fn new(id: usize, position: Vec3, direction: Vec3) -> Self {
        Boid {
            id,
            role: BoidRole::Mob,
            position,
            direction,
            orientation: Quat::IDENTITY,
            speed: direction.length(),
        }
    }

    pub fn predator(id: usize, position: Vec3, direction: Vec3) -> Self {
        Boid {
            role: BoidRole::Predator,
            ..Boid::new(id, position, direction)
        }
    }

    pub fn is_predator(&self) -> bool {
        self.role == BoidRole::Predator
    }

    /// Sums up every rule that applies to this agent's role.
    ///
    /// Mobs flock with `others` and run from the predator, a predator only
    /// minds the walls (and hunts when pursuit is switched on).
    pub fn run_rules(
        &self,
        others: &[Boid],
        predator: Option<&Boid>,
        run_options: &RunOptions,
    ) -> Steering {
        let mut sum = self.wall_ahead(run_options);

        match self.role {
            BoidRole::Mob => {
                sum = sum + self.separation(others, run_options);

                if let Some(predator) = predator {
                    sum = sum + self.avoid_predator(predator, run_options);
                }

                sum.delta += self.cohesion(others, run_options);
            }
            BoidRole::Predator => {
                if run_options.predator_pursuit_weight != 0. {
                    sum.delta += self.pursue(others, run_options);
                }
            }
        }

        sum
    }

    pub fn separation(&self, others: &[Boid], run_options: &RunOptions) -> Steering {
        let mut res = Steering::NONE;

        for other in others {
            if other.id == self.id {
                continue;
            }

            let distance = self.position.distance(other.position);
            res.closest = res.closest.min(distance);

            if distance < run_options.separation_radius {
                res.delta += away_from(
                    self.position,
                    other.position,
                    run_options.separation_strength,
                );
            }
        }

        res
    }

    pub fn avoid_predator(&self, predator: &Boid, run_options: &RunOptions) -> Steering {
        let distance = self.position.distance(predator.position);

        let delta = if distance < run_options.predator_avoid_radius {
            away_from(
                self.position,
                predator.position,
                run_options.predator_avoid_strength,
            )
        } else {
            Vec3::ZERO
        };

        Steering {
            delta,
            closest: distance,
        }
    }

    /// Looks for a wall straight ahead, only ever slows the agent down
    pub fn wall_ahead(&self, run_options: &RunOptions) -> Steering {
        let closest = run_options
            .bounds
            .ray_cast(self.position, self.direction, run_options.probe_length())
            .map_or(f32::INFINITY, |hit| hit.distance);

        Steering {
            delta: Vec3::ZERO,
            closest,
        }
    }

    /// Pull toward the centre of mass of the neighbours in `cohesion_radius`,
    /// plus matching their headings, both out of a single scan.
    pub fn cohesion(&self, others: &[Boid], run_options: &RunOptions) -> Vec3 {
        let mut center = Vec3::ZERO;
        let mut matching = Vec3::ZERO;
        let mut count = 0;

        for other in others {
            if other.id == self.id {
                continue;
            }

            if self.position.distance(other.position) < run_options.cohesion_radius {
                center += other.position;
                matching += other.direction * run_options.velocity_matching_weight;
                count += 1;
            }
        }

        if count > 0 {
            center /= count as f32;
            safe_normalize(center - self.position) * run_options.alignment_weight + matching
        } else {
            Vec3::ZERO
        }
    }

    pub fn pursue(&self, others: &[Boid], run_options: &RunOptions) -> Vec3 {
        others
            .iter()
            .filter(|b| b.id != self.id)
            .min_by(|a, b| {
                let da = a.position.distance_squared(self.position);
                let db = b.position.distance_squared(self.position);
                da.total_cmp(&db)
            })
            .map_or(Vec3::ZERO, |target| {
                safe_normalize(target.position - self.position)
                    * run_options.predator_pursuit_weight
            })
    }

    /// Eases the displayed orientation toward the current heading
    pub fn rotate(&mut self, run_options: &RunOptions) {
        self.orientation = smooth_orientation(
            self.orientation,
            self.direction,
            run_options.reference_axis,
            run_options.orientation_blend,
        );
    }

    /// Speed this tick's heading gets.
    ///
    /// With speed modulation on, agents slow down linearly as the closest
    /// threat gets within `separation_radius`, otherwise `desired` keeps its
    /// own length clamped into the speed range.
    pub fn target_speed(desired: Vec3, closest: f32, run_options: &RunOptions) -> f32 {
        if run_options.speed_modulation_on {
            lerp_speed(
                run_options.min_speed,
                run_options.max_speed,
                closest / run_options.separation_radius,
            )
        } else {
            desired
                .length()
                .clamp(run_options.min_speed, run_options.max_speed)
        }
    }

    /// `desired` rescaled into the speed range, `None` when it has no heading
    pub fn limit_speed(desired: Vec3, closest: f32, run_options: &RunOptions) -> Option<Vec3> {
        let heading = desired.try_normalize()?;
        Some(heading * Boid::target_speed(desired, closest, run_options))
    }

    /// Actually shifts the individual's location
    pub fn update_location(&mut self, run_options: &RunOptions) {
        self.position += self.direction * run_options.step_size;
    }

    pub fn boundaries<R: Rng>(&mut self, run_options: &RunOptions, rng: &mut R) {
        match run_options.boundary {
            Boundary::Reflective {
                near_threshold,
                probe_length,
            } => {
                let hit = run_options
                    .bounds
                    .ray_cast(self.position, self.direction, probe_length);

                if let Some(hit) = hit {
                    if hit.distance < near_threshold {
                        self.direction = self.direction.reflect(hit.normal);
                    }
                }
            }
            Boundary::Clamp { jitter } => {
                let limits = run_options.bounds.half_extents;

                for axis in 0..3 {
                    let p = self.position[axis];
                    let d = self.direction[axis];

                    // Not the unconditional flip on every tick past the face: an
                    // agent already heading back in keeps its heading, or it would
                    // flip again each tick it is still outside.
                    if (p > limits[axis] && d >= 0.) || (p < -limits[axis] && d <= 0.) {
                        let noise = if jitter > 0. {
                            rng.gen_range(-jitter..jitter)
                        } else {
                            0.
                        };
                        self.direction[axis] = -d + noise;
                    }
                }
            }
        };

        self.direction = safe_normalize(self.direction);
    }
}

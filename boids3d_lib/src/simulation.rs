use glam::Vec3;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, trace, warn};

use crate::{
    boid::{Boid, Steering},
    bounds::WorldBounds,
    flock::{random_heading, random_position, Flock},
    options::{Boundary, OptionsError, RunOptions, UpdateMode},
};

/// Drives the flock and its predator one tick at a time.
///
/// Per agent and tick the order is fixed: rotate, steer (separation,
/// predator, walls, cohesion), limit speed, integrate, apply the boundary
/// policy. Boids go first in index order, the predator last.
pub struct Simulation {
    flock: Flock,
    predator: Option<Boid>,
    bounds: WorldBounds,
    boundary: Boundary,
    rng: Xoshiro256PlusPlus,
    tick: u64,
}

impl Simulation {
    /// Spawns `init_boids` boids, and the predator if enabled, at random
    /// inside the spawn cube.
    pub fn new(run_options: &RunOptions) -> Result<Self, OptionsError> {
        run_options.validate()?;

        let mut rng = get_rng(run_options);
        let flock = Flock::new(run_options, &mut rng);
        let predator = if run_options.predator_on {
            let position = random_position(run_options, &mut rng);
            Some(Boid::predator(flock.len(), position, random_heading(&mut rng)))
        } else {
            None
        };

        debug!(
            boids = flock.len(),
            predator = predator.is_some(),
            boundary = ?run_options.boundary,
            update_mode = ?run_options.update_mode,
            "simulation created"
        );

        Ok(Simulation {
            flock,
            predator,
            bounds: run_options.bounds,
            boundary: run_options.boundary,
            rng,
            tick: 0,
        })
    }

    /// Starts from explicitly placed agents.
    ///
    /// Boids are renumbered by position in `boids`, the predator (if any)
    /// takes the next id.
    pub fn with_agents(
        boids: Vec<Boid>,
        predator: Option<Boid>,
        run_options: &RunOptions,
    ) -> Result<Self, OptionsError> {
        RunOptions {
            init_boids: boids.len(),
            ..run_options.clone()
        }
        .validate()?;

        let flock = Flock::from_boids(boids);
        let predator = predator.map(|p| Boid::predator(flock.len(), p.position, p.direction));

        Ok(Simulation {
            predator,
            bounds: run_options.bounds,
            boundary: run_options.boundary,
            rng: get_rng(run_options),
            tick: 0,
            flock,
        })
    }

    /// Advances the world by one tick.
    ///
    /// `run_options` is read once for the whole tick, so a tuning UI can
    /// change it in between ticks. World bounds and the boundary policy stay
    /// the ones the simulation was created with.
    ///
    /// ## Errors
    /// Options that fail [`RunOptions::validate`] leave the world untouched.
    pub fn step(&mut self, run_options: &RunOptions) -> Result<(), OptionsError> {
        let effective = RunOptions {
            init_boids: self.flock.len(),
            bounds: self.bounds,
            boundary: self.boundary,
            ..run_options.clone()
        };
        effective.validate()?;

        if run_options.boundary != self.boundary || run_options.bounds != self.bounds {
            debug!("boundary policy is fixed at creation, ignoring the change");
        }

        match effective.update_mode {
            UpdateMode::Deferred => self.step_deferred(&effective),
            UpdateMode::Immediate => self.step_immediate(&effective),
        }

        self.tick += 1;
        trace!(tick = self.tick, "tick done");

        Ok(())
    }

    fn step_deferred(&mut self, run_options: &RunOptions) {
        let snapshot = self.flock.boids.clone();
        let predator = self.predator;

        for (boid, before) in self.flock.boids.iter_mut().zip(snapshot.iter()) {
            boid.rotate(run_options);
            let steering = before.run_rules(&snapshot, predator.as_ref(), run_options);
            advance(boid, steering, run_options, &mut self.rng);
        }

        if let Some(predator) = self.predator.as_mut() {
            predator.rotate(run_options);
            let steering = predator.run_rules(&snapshot, None, run_options);
            advance(predator, steering, run_options, &mut self.rng);
        }
    }

    fn step_immediate(&mut self, run_options: &RunOptions) {
        for i in 0..self.flock.boids.len() {
            self.flock.boids[i].rotate(run_options);
            let steering =
                self.flock.boids[i].run_rules(&self.flock.boids, self.predator.as_ref(), run_options);
            advance(&mut self.flock.boids[i], steering, run_options, &mut self.rng);
        }

        if let Some(predator) = self.predator.as_mut() {
            predator.rotate(run_options);
            let steering = predator.run_rules(&self.flock.boids, None, run_options);
            advance(predator, steering, run_options, &mut self.rng);
        }
    }

    /// Every agent, boids in id order followed by the predator
    pub fn view(&self) -> impl Iterator<Item = &Boid> + Clone + '_ {
        self.flock.boids.iter().chain(self.predator.iter())
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn predator(&self) -> Option<&Boid> {
        self.predator.as_ref()
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// number of ticks run so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Respawns the flock and predator, world and policy stay as they are
    pub fn restart(&mut self, run_options: &RunOptions) {
        self.flock.restart(run_options, &mut self.rng);

        if let Some(predator) = self.predator.as_mut() {
            predator.position = random_position(run_options, &mut self.rng);
            predator.direction = random_heading(&mut self.rng);
            predator.id = self.flock.len();
        }

        self.tick = 0;
    }
}

fn get_rng(run_options: &RunOptions) -> Xoshiro256PlusPlus {
    match run_options.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

/// Limits speed, integrates and applies the boundary policy for one agent
fn advance(
    agent: &mut Boid,
    steering: Steering,
    run_options: &RunOptions,
    rng: &mut Xoshiro256PlusPlus,
) {
    let desired = agent.direction + steering.delta;

    let direction = Boid::limit_speed(desired, steering.closest, run_options)
        .or_else(|| Boid::limit_speed(agent.direction, steering.closest, run_options))
        .unwrap_or_else(|| {
            // Steering cancelled out and there is no previous heading to fall
            // back on. Any heading beats standing still, pick one at random.
            warn!(id = agent.id, "agent has no heading, picking a random one");
            random_heading(rng) * Boid::target_speed(Vec3::ZERO, steering.closest, run_options)
        });

    agent.direction = direction;
    agent.speed = direction.length();

    agent.update_location(run_options);
    agent.boundaries(run_options, rng);
}

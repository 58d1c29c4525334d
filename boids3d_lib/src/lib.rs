use birdwatcher::{Birdwatcher, BoidData};
use options::{OptionsError, RunOptions};
use simulation::Simulation;

pub mod boid;
pub mod bounds;
pub mod flock;
pub mod simulation;

pub mod birdwatcher;
pub mod math_helpers;
pub mod options;

/// Runs a fresh simulation for `no_iter` ticks without any host loop,
/// sampling every `sample_rate` ticks.
pub fn flock_base(
    no_iter: u64,
    sample_rate: u64,
    run_options: &RunOptions,
) -> Result<Vec<BoidData>, OptionsError> {
    let mut simulation = Simulation::new(run_options)?;
    let mut bird_watcher = Birdwatcher::new(sample_rate);

    for _ in 0..no_iter {
        simulation.step(run_options)?;
        bird_watcher.watch(&simulation, run_options);
    }

    Ok(bird_watcher.pop_data())
}

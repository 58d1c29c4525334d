use std::mem;

use serde::Serialize;

use crate::{boid::BoidRole, options::RunOptions, simulation::Simulation};

// this is the output surface a renderer would read, one row per agent and sample
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoidData {
    pub id: usize,
    pub role: BoidRole,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// orientation quaternion
    pub qx: f32,
    pub qy: f32,
    pub qz: f32,
    pub qw: f32,
    pub speed: f32,
    /// boids within cohesion radius
    pub n_neighbours: usize,
    pub time: u64,
}

/// Samples the agents of a simulation every `sample_rate` ticks, in memory
pub struct Birdwatcher {
    locations: Vec<BoidData>,
    render_ticker: u64,
    sample_rate: u64,
}

impl Birdwatcher {
    pub fn new(sample_rate: u64) -> Self {
        Birdwatcher {
            locations: Vec::new(),
            render_ticker: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Triggers data collection
    pub fn watch(&mut self, simulation: &Simulation, run_options: &RunOptions) {
        if !self.should_sample() {
            return;
        }

        let time = self.render_ticker / self.sample_rate;
        let flock = simulation.flock();

        let mut current_locations: Vec<BoidData> = simulation
            .view()
            .map(|b| BoidData {
                id: b.id,
                role: b.role,
                x: b.position.x,
                y: b.position.y,
                z: b.position.z,
                qx: b.orientation.x,
                qy: b.orientation.y,
                qz: b.orientation.z,
                qw: b.orientation.w,
                speed: b.speed,
                n_neighbours: flock
                    .get_neighbours(b, run_options.cohesion_radius)
                    .count(),
                time,
            })
            .collect();

        self.locations.append(&mut current_locations);
    }

    pub fn restart(&mut self) {
        self.locations.clear();
        self.render_ticker = 0;
    }

    pub fn data(&self) -> &[BoidData] {
        &self.locations
    }

    /// The rows of the latest sample
    pub fn last_frame(&self) -> &[BoidData] {
        match self.locations.last() {
            Some(last) => {
                let start = self
                    .locations
                    .iter()
                    .rposition(|d| d.time != last.time)
                    .map_or(0, |i| i + 1);
                &self.locations[start..]
            }
            None => &[],
        }
    }

    pub fn pop_data(&mut self) -> Vec<BoidData> {
        mem::take(&mut self.locations)
    }

    fn should_sample(&mut self) -> bool {
        self.render_ticker += 1;

        self.render_ticker % self.sample_rate == 0
    }
}

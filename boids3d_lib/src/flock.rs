use glam::Vec3;
use rand::Rng;

use crate::boid::Boid;
use crate::options::RunOptions;

/// The boids of a simulation, fixed in number once spawned.
///
/// Neighbour lookups are a naive O(N^2) scan over every other boid.
#[derive(Debug, Clone)]
pub struct Flock {
    pub boids: Vec<Boid>,
}

impl Flock {
    pub fn new<R: Rng>(run_options: &RunOptions, rng: &mut R) -> Self {
        Flock {
            boids: get_boids(run_options, rng),
        }
    }

    /// Takes pre-placed boids, ids are reassigned to match their index
    pub fn from_boids(boids: Vec<Boid>) -> Self {
        let boids = boids
            .into_iter()
            .enumerate()
            .map(|(id, b)| Boid { id, ..b })
            .collect();

        Flock { boids }
    }

    pub fn view(&self) -> &[Boid] {
        &self.boids
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Every other boid closer to `boid` than `radius`
    pub fn get_neighbours<'a>(
        &'a self,
        boid: &'a Boid,
        radius: f32,
    ) -> impl Iterator<Item = &'a Boid> + 'a {
        self.boids
            .iter()
            .filter(move |b_other| {
                b_other.id != boid.id && b_other.position.distance(boid.position) < radius
            })
    }

    pub fn restart<R: Rng>(&mut self, run_options: &RunOptions, rng: &mut R) {
        self.boids = get_boids(run_options, rng);
    }
}

fn get_boids<R: Rng>(run_options: &RunOptions, rng: &mut R) -> Vec<Boid> {
    (0..run_options.init_boids)
        .map(|id| Boid::new(id, random_position(run_options, rng), random_heading(rng)))
        .collect()
}

/// uniform in the spawn cube, [-spawn_half_extent, spawn_half_extent) on every axis
pub(crate) fn random_position<R: Rng>(run_options: &RunOptions, rng: &mut R) -> Vec3 {
    let h = run_options.spawn_half_extent;
    Vec3::new(
        rng.gen_range(-h..h),
        rng.gen_range(-h..h),
        rng.gen_range(-h..h),
    )
}

/// A random unit heading
pub(crate) fn random_heading<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        // components in [-1, 1), drawn again in the unlikely case of a zero vector
        let v = Vec3::new(
            rng.gen::<f32>() * 2. - 1.,
            rng.gen::<f32>() * 2. - 1.,
            rng.gen::<f32>() * 2. - 1.,
        );

        if let Some(heading) = v.try_normalize() {
            return heading;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::{random_heading, Flock};
    use crate::{boid::Boid, options::RunOptions};

    #[test]
    fn spawns_inside_the_spawn_cube() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let run_options = RunOptions {
            init_boids: 200,
            ..Default::default()
        };

        let flock = Flock::new(&run_options, &mut rng);

        assert_eq!(flock.len(), 200);
        for (index, b) in flock.view().iter().enumerate() {
            assert_eq!(b.id, index);
            assert!(b.position.abs().max_element() <= 5.);
            assert_relative_eq!(b.direction.length(), 1., epsilon = 1e-5);
        }
    }

    #[test]
    fn same_seed_same_flock() {
        let run_options = RunOptions::default();
        let a = Flock::new(&run_options, &mut Xoshiro256PlusPlus::seed_from_u64(3));
        let b = Flock::new(&run_options, &mut Xoshiro256PlusPlus::seed_from_u64(3));

        assert_eq!(a.view(), b.view());
    }

    #[test]
    fn from_boids_reindexes() {
        let flock = Flock::from_boids(vec![
            Boid::new(7, Vec3::ZERO, Vec3::X),
            Boid::new(7, Vec3::ONE, Vec3::X),
        ]);

        let ids: Vec<usize> = flock.view().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn neighbours_exclude_self_and_far_boids() {
        let flock = Flock::from_boids(vec![
            Boid::new(0, Vec3::ZERO, Vec3::X),
            Boid::new(0, Vec3::new(0.5, 0., 0.), Vec3::X),
            Boid::new(0, Vec3::new(0., 2., 0.), Vec3::X),
        ]);
        let me = flock.boids[0];

        let ids: Vec<usize> = flock.get_neighbours(&me, 1.).map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn restart_respawns_the_same_number() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let run_options = RunOptions::default();
        let mut flock = Flock::new(&run_options, &mut rng);
        let before = flock.boids.clone();

        flock.restart(&run_options, &mut rng);

        assert_eq!(flock.len(), before.len());
        assert_ne!(flock.view(), &before[..]);
    }

    #[test]
    fn random_heading_is_unit() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        for _ in 0..100 {
            assert_relative_eq!(random_heading(&mut rng).length(), 1., epsilon = 1e-5);
        }
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Static axis-aligned box centred on the origin, the world the agents live in.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct WorldBounds {
    /// distance from the origin to each face, per axis
    pub half_extents: Vec3,
}

/// Where a ray left the box
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct RayHit {
    /// distance travelled along the (normalized) ray
    pub distance: f32,
    pub point: Vec3,
    /// unit normal of the face that was hit, pointing into the box
    pub normal: Vec3,
}

impl WorldBounds {
    pub fn new(half_extents: Vec3) -> Self {
        WorldBounds { half_extents }
    }

    pub fn cube(half_extent: f32) -> Self {
        WorldBounds::new(Vec3::splat(half_extent))
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.abs().cmple(self.half_extents).all()
    }

    /// Distance from `point` to the nearest face, negative once outside
    pub fn distance_to_boundary(&self, point: Vec3) -> f32 {
        (self.half_extents - point.abs()).min_element()
    }

    /// Casts a ray from `origin` along `direction` against the faces of the box.
    ///
    /// Only the face the ray exits through is considered, so for an origin
    /// inside the box this is the wall ahead. An origin already past a face
    /// while still heading outward hits that face at distance 0.
    ///
    /// ## Returns
    /// `None` when `direction` is zero or the face is further than `max_distance`
    pub fn ray_cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.try_normalize()?;

        let mut best: Option<(f32, usize)> = None;
        for axis in 0..3 {
            let d = dir[axis];
            if d == 0. {
                continue;
            }

            let face = self.half_extents[axis].copysign(d);
            let t = ((face - origin[axis]) / d).max(0.);

            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, axis));
            }
        }

        let (distance, axis) = best?;
        if distance > max_distance {
            return None;
        }

        let mut normal = Vec3::ZERO;
        normal[axis] = -dir[axis].signum();

        Some(RayHit {
            distance,
            point: origin + dir * distance,
            normal,
        })
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds::new(Vec3::new(30., 15., 15.))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec3;
    use rstest::rstest;

    use super::WorldBounds;

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-4_f32)
        };
    }

    #[rstest]
    #[case(Vec3::X, 25., Vec3::NEG_X)]
    #[case(Vec3::NEG_X, 35., Vec3::X)]
    #[case(Vec3::Y, 15., Vec3::NEG_Y)]
    #[case(Vec3::NEG_Y, 15., Vec3::Y)]
    #[case(Vec3::Z, 15., Vec3::NEG_Z)]
    #[case(Vec3::NEG_Z, 15., Vec3::Z)]
    fn ray_hits_each_face(#[case] dir: Vec3, #[case] distance: f32, #[case] normal: Vec3) {
        let bounds = WorldBounds::default();
        let origin = Vec3::new(5., 0., 0.);

        let hit = bounds.ray_cast(origin, dir, 500.).unwrap();

        assert_eqf32!(hit.distance, distance);
        assert_eq!(hit.normal, normal);
        assert_eqf32!(hit.point.distance(origin + dir * distance), 0.);
    }

    #[test]
    fn ray_beyond_probe_misses() {
        let bounds = WorldBounds::default();
        assert!(bounds.ray_cast(Vec3::ZERO, Vec3::X, 15.).is_none());
        assert!(bounds.ray_cast(Vec3::ZERO, Vec3::X, 30.).is_some());
    }

    #[test]
    fn ray_with_zero_direction_misses() {
        let bounds = WorldBounds::default();
        assert!(bounds.ray_cast(Vec3::ZERO, Vec3::ZERO, 500.).is_none());
    }

    #[test]
    fn diagonal_ray_exits_through_nearest_face() {
        let bounds = WorldBounds::cube(10.);
        let origin = Vec3::new(0., 8., 0.);
        let hit = bounds.ray_cast(origin, Vec3::new(1., 1., 0.), 500.).unwrap();

        assert_eq!(hit.normal, Vec3::NEG_Y);
        assert_eqf32!(hit.distance, 2. * 2f32.sqrt());
        assert_eqf32!(hit.point.y, 10.);
    }

    #[test]
    fn escaped_origin_heading_out_hits_immediately() {
        let bounds = WorldBounds::cube(10.);
        let hit = bounds
            .ray_cast(Vec3::new(0., 0., -12.), Vec3::NEG_Z, 15.)
            .unwrap();

        assert_eqf32!(hit.distance, 0.);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn escaped_origin_heading_back_sees_far_face() {
        let bounds = WorldBounds::cube(10.);
        let hit = bounds.ray_cast(Vec3::new(0., 0., -12.), Vec3::Z, 500.).unwrap();

        assert_eqf32!(hit.distance, 22.);
        assert_eq!(hit.normal, Vec3::NEG_Z);
    }

    #[test]
    fn distance_to_boundary_and_contains() {
        let bounds = WorldBounds::default();

        assert_eqf32!(bounds.distance_to_boundary(Vec3::ZERO), 15.);
        assert_eqf32!(bounds.distance_to_boundary(Vec3::new(28., 0., 0.)), 2.);
        assert!(bounds.distance_to_boundary(Vec3::new(0., 0., -16.)) < 0.);

        assert!(bounds.contains(Vec3::new(29., -14., 14.)));
        assert!(!bounds.contains(Vec3::new(31., 0., 0.)));
    }
}

use glam::{Quat, Vec3};

/// Normalizes `v`, mapping a zero (or non-finite) vector onto [`Vec3::ZERO`]
/// instead of producing NaN.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Unit vector pointing from `other` to `from`, scaled by `strength`.
///
/// Coincident points produce no push at all.
#[inline]
pub fn away_from(from: Vec3, other: Vec3, strength: f32) -> Vec3 {
    safe_normalize(from - other) * strength
}

/// Linear interpolation of a speed in between `min_speed` and `max_speed`,
/// `t` is clamped to [0, 1]
#[inline]
pub fn lerp_speed(min_speed: f32, max_speed: f32, t: f32) -> f32 {
    min_speed + (max_speed - min_speed) * t.clamp(0., 1.)
}

/// Rotation taking `reference` onto the direction of `heading` along the
/// shortest arc, `None` when either vector has no direction.
pub fn rotation_to(reference: Vec3, heading: Vec3) -> Option<Quat> {
    let from = reference.try_normalize()?;
    let to = heading.try_normalize()?;

    Some(Quat::from_rotation_arc(from, to))
}

/// First order low-pass filter on orientation: moves `current` a `blend`
/// fraction of the way toward the rotation mapping `reference` onto `heading`.
pub fn smooth_orientation(current: Quat, heading: Vec3, reference: Vec3, blend: f32) -> Quat {
    match rotation_to(reference, heading) {
        Some(target) => current.slerp(target, blend).normalize(),
        None => current,
    }
}

/// Mean squared distance of points from their centroid
pub fn positional_variance<I>(positions: I) -> f32
where
    I: IntoIterator<Item = Vec3>,
    I::IntoIter: Clone,
{
    let positions = positions.into_iter();
    let (sum, count) = positions
        .clone()
        .fold((Vec3::ZERO, 0usize), |(sum, count), p| (sum + p, count + 1));

    if count == 0 {
        return 0.;
    }

    let centroid = sum / count as f32;
    positions
        .map(|p| p.distance_squared(centroid))
        .sum::<f32>()
        / count as f32
}

// glam only grew a reflect on vectors in later releases
pub trait Reflect {
    fn reflect(&self, normal: Vec3) -> Self;
}

impl Reflect for Vec3 {
    /// `self - 2(self·n)n` with `n` the normalized `normal`
    #[inline]
    fn reflect(&self, normal: Vec3) -> Self {
        let n = safe_normalize(normal);
        *self - 2. * self.dot(n) * n
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};
    use rstest::rstest;

    use super::*;

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-5_f32)
        };
    }

    #[test]
    fn safe_normalize_zero_is_zero() {
        let res = safe_normalize(Vec3::ZERO);
        assert_eq!(res, Vec3::ZERO);
        assert!(!res.is_nan());
    }

    #[test]
    fn away_from_points_away_with_strength() {
        let res = away_from(Vec3::ZERO, Vec3::new(1., 0., 0.), 2.);
        assert_eqf32!(res.x, -2.);
        assert_eqf32!(res.y, 0.);
        assert_eqf32!(res.z, 0.);
    }

    #[test]
    fn away_from_coincident_is_zero() {
        let p = Vec3::new(3., -1., 2.);
        assert_eq!(away_from(p, p, 2.), Vec3::ZERO);
    }

    #[rstest]
    #[case(0.0, 0.01)]
    #[case(0.5, 0.055)]
    #[case(1.0, 0.1)]
    #[case(4.0, 0.1)]
    #[case(-1.0, 0.01)]
    fn lerp_speed_clamps(#[case] t: f32, #[case] expected: f32) {
        assert_eqf32!(lerp_speed(0.01, 0.1, t), expected);
    }

    #[test]
    fn reflect_head_on() {
        let incoming = Vec3::new(0., 0., -1.);
        let reflected = incoming.reflect(Vec3::new(0., 0., 1.));
        assert_eqf32!(reflected.x, 0.);
        assert_eqf32!(reflected.y, 0.);
        assert_eqf32!(reflected.z, 1.);
    }

    #[test]
    fn reflect_keeps_tangential_component() {
        let incoming = Vec3::new(0.6, 0., -0.8);
        // normal need not be unit length
        let reflected = incoming.reflect(Vec3::new(0., 0., 5.));
        assert_eqf32!(reflected.x, 0.6);
        assert_eqf32!(reflected.z, 0.8);
        assert_eqf32!(reflected.length(), incoming.length());
    }

    #[test]
    fn rotation_to_maps_reference_onto_heading() {
        let heading = Vec3::new(1., 1., 0.);
        let q = rotation_to(Vec3::Y, heading).unwrap();
        let mapped = q * Vec3::Y;
        let expected = heading.normalize();
        assert_eqf32!(mapped.x, expected.x);
        assert_eqf32!(mapped.y, expected.y);
        assert_eqf32!(mapped.z, expected.z);
    }

    #[test]
    fn rotation_to_zero_heading_is_none() {
        assert!(rotation_to(Vec3::Y, Vec3::ZERO).is_none());
    }

    #[test]
    fn smooth_orientation_zero_heading_keeps_orientation() {
        let current = Quat::from_rotation_z(0.3);
        assert_eq!(smooth_orientation(current, Vec3::ZERO, Vec3::Y, 0.1), current);
    }

    #[test]
    fn smooth_orientation_converges_without_overshoot() {
        let heading = Vec3::new(1., 0., 0.);
        // chord between the rotated reference axis and the heading, no acos noise
        let error = |q: Quat| (q * Vec3::Y - heading).length();

        let mut q = Quat::IDENTITY;
        let mut last_error = error(q);

        for _ in 0..200 {
            q = smooth_orientation(q, heading, Vec3::Y, 0.1);
            let e = error(q);
            if last_error > 1e-4 {
                assert!(e < last_error, "{e} >= {last_error}");
            }
            last_error = e;
        }

        assert!(last_error < 1e-4);
    }

    #[test]
    fn smooth_orientation_is_a_fixed_point_at_target() {
        let heading = Vec3::new(0., 0., -1.);
        let target = rotation_to(Vec3::Y, heading).unwrap();
        let q = smooth_orientation(target, heading, Vec3::Y, 0.1);
        assert!((q * Vec3::Y - heading).length() < 1e-5);
    }

    #[test]
    fn variance_of_symmetric_points() {
        let points = [
            Vec3::new(1., 0., 0.),
            Vec3::new(-1., 0., 0.),
            Vec3::new(0., 1., 0.),
            Vec3::new(0., -1., 0.),
        ];
        assert_eqf32!(positional_variance(points), 1.);
        assert_eqf32!(positional_variance(Vec::<Vec3>::new()), 0.);
    }
}

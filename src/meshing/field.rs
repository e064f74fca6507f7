use glam::Vec3;

use crate::common::FIELD_SENTINEL;
use crate::data::Primitive;

/// Blended field value and color at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub value: f32,
    pub color: Vec3,
}

impl FieldSample {
    /// a point that no primitive influences
    pub const EMPTY: FieldSample = FieldSample {
        value: FIELD_SENTINEL,
        color: Vec3::ZERO,
    };
}

/// Polynomial smooth minimum of the running sample `a` and a candidate `b`
///
/// `smooth_k <= 0` is the hard minimum, the candidate only wins when it is strictly smaller
#[inline]
pub fn smooth_min(a: FieldSample, b: FieldSample, smooth_k: f32) -> FieldSample {
    if smooth_k <= 0. {
        return if b.value < a.value { b } else { a };
    }
    let h = (0.5 + 0.5 * (a.value - b.value) / smooth_k).clamp(0., 1.);
    // expanded so that `h == 1` drops the sentinel exactly
    FieldSample {
        value: a.value * (1. - h) + b.value * h - smooth_k * h * (1. - h),
        color: a.color * (1. - h) + b.color * h,
    }
}

#[inline]
pub fn sphere_distance(point: Vec3, primitive: &Primitive) -> f32 {
    point.distance(primitive.center()) - primitive.radius
}

/// Smooth union of every primitive's signed distance at `point`
pub fn evaluate(point: Vec3, primitives: &[Primitive], smooth_k: f32) -> FieldSample {
    primitives.iter().fold(FieldSample::EMPTY, |sample, primitive| {
        let candidate = FieldSample {
            value: sphere_distance(point, primitive),
            color: primitive.color(),
        };
        smooth_min(sample, candidate, smooth_k)
    })
}

/// Central difference gradient of the field, `step` is the offset along each axis
pub fn gradient(point: Vec3, primitives: &[Primitive], smooth_k: f32, step: f32) -> Vec3 {
    let value = |offset: Vec3| evaluate(point + offset, primitives, smooth_k).value;
    Vec3::new(
        value(Vec3::X * step) - value(Vec3::NEG_X * step),
        value(Vec3::Y * step) - value(Vec3::NEG_Y * step),
        value(Vec3::Z * step) - value(Vec3::NEG_Z * step),
    ) / (2. * step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sphere(x: f32, radius: f32, color: Vec3) -> Primitive {
        Primitive::new(Vec3::new(x, 0., 0.), radius, color)
    }

    #[test]
    fn no_primitives_is_outside_everywhere() {
        let sample = evaluate(Vec3::ZERO, &[], 0.05);
        assert_eq!(sample, FieldSample::EMPTY);
    }

    #[test]
    fn single_primitive_is_exact_under_smoothing() {
        let primitives = [sphere(0., 0.1, Vec3::ONE)];
        let sample = evaluate(Vec3::new(0.3, 0., 0.), &primitives, 0.05);
        assert_relative_eq!(sample.value, 0.2, epsilon = 1e-6);
        assert_eq!(sample.color, Vec3::ONE);
    }

    #[test]
    fn hard_minimum_without_smoothing() {
        let primitives = [
            sphere(-0.2, 0.05, Vec3::X),
            sphere(0.15, 0.1, Vec3::Y),
            sphere(0.4, 0.02, Vec3::Z),
        ];
        for step in 0..40 {
            let point = Vec3::new(-0.5 + step as f32 * 0.025, 0.03, -0.01);
            let sample = evaluate(point, &primitives, 0.);
            let (nearest, distance) = primitives
                .iter()
                .map(|primitive| (primitive, sphere_distance(point, primitive)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap();
            assert_eq!(sample.value, distance);
            assert_eq!(sample.color, nearest.color());
        }
    }

    #[test]
    fn hard_minimum_keeps_first_on_ties() {
        let a = FieldSample { value: 1., color: Vec3::X };
        let b = FieldSample { value: 1., color: Vec3::Y };
        assert_eq!(smooth_min(a, b, 0.).color, Vec3::X);
    }

    #[test]
    fn smoothing_pulls_the_field_below_both_inputs() {
        let a = FieldSample { value: 0.01, color: Vec3::ONE };
        let b = FieldSample { value: 0.01, color: Vec3::ZERO };
        let blended = smooth_min(a, b, 0.05);
        assert_relative_eq!(blended.value, 0.01 - 0.05 * 0.25, epsilon = 1e-7);
        assert_relative_eq!(blended.color.x, 0.5, epsilon = 1e-7);
    }

    #[test]
    fn distant_candidates_do_not_blend() {
        let a = FieldSample { value: 0.2, color: Vec3::ONE };
        let b = FieldSample { value: -0.2, color: Vec3::ZERO };
        assert_eq!(smooth_min(a, b, 0.05), b);
        assert_eq!(smooth_min(b, a, 0.05), b);
    }

    #[test]
    fn gradient_points_away_from_the_center() {
        let primitives = [sphere(0., 0.1, Vec3::ONE)];
        let point = Vec3::new(0.06, 0.08, 0.);
        let normal = gradient(point, &primitives, 0., 0.001).normalize();
        assert_relative_eq!(normal.x, 0.6, epsilon = 1e-3);
        assert_relative_eq!(normal.y, 0.8, epsilon = 1e-3);
    }
}

//! Keyframe interpolation for glTF animation channels
//!
//! Values are stored as `Vec4` for every property: translation and scale use
//! `xyz`, rotation is an `xyzw` quaternion. Times outside the keyframe range
//! clamp to the first or last key.

use glam::{Quat, Vec4};

/// Channel interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Outputs hold `(in_tangent, value, out_tangent)` triplets per key
    CubicSpline,
}

impl From<gltf::animation::Interpolation> for Interpolation {
    fn from(value: gltf::animation::Interpolation) -> Self {
        match value {
            gltf::animation::Interpolation::Step => Self::Step,
            gltf::animation::Interpolation::Linear => Self::Linear,
            gltf::animation::Interpolation::CubicSpline => Self::CubicSpline,
        }
    }
}

/// Sample a keyframed vector at `t`
pub fn sample_vector(times: &[f32], values: &[Vec4], interpolation: Interpolation, t: f32) -> Vec4 {
    sample(times, values, interpolation, t, |a, b, f| a.lerp(b, f))
}

/// Sample a keyframed rotation at `t`; result is normalized
pub fn sample_rotation(
    times: &[f32],
    values: &[Vec4],
    interpolation: Interpolation,
    t: f32,
) -> Quat {
    let q = sample(times, values, interpolation, t, |a, b, f| {
        Vec4::from(Quat::from_vec4(a).slerp(Quat::from_vec4(b), f))
    });
    Quat::from_vec4(q).normalize()
}

fn sample(
    times: &[f32],
    values: &[Vec4],
    interpolation: Interpolation,
    t: f32,
    mix: impl Fn(Vec4, Vec4, f32) -> Vec4,
) -> Vec4 {
    let value_at = |key: usize| match interpolation {
        Interpolation::CubicSpline => values[key * 3 + 1],
        _ => values[key],
    };

    let Some(&last_time) = times.last() else {
        return Vec4::ZERO;
    };
    if t <= times[0] {
        return value_at(0);
    }
    if t >= last_time {
        return value_at(times.len() - 1);
    }

    // First key strictly after t; t lies in [times[k], times[k + 1])
    let k = times.partition_point(|&key| key <= t) - 1;
    let (t0, t1) = (times[k], times[k + 1]);
    let dt = t1 - t0;
    let f = if dt > 0.0 { (t - t0) / dt } else { 0.0 };

    match interpolation {
        Interpolation::Step => value_at(k),
        Interpolation::Linear => mix(value_at(k), value_at(k + 1), f),
        Interpolation::CubicSpline => {
            let p0 = values[k * 3 + 1];
            let m0 = values[k * 3 + 2] * dt;
            let p1 = values[(k + 1) * 3 + 1];
            let m1 = values[(k + 1) * 3] * dt;

            let f2 = f * f;
            let f3 = f2 * f;
            p0 * (2.0 * f3 - 3.0 * f2 + 1.0)
                + m0 * (f3 - 2.0 * f2 + f)
                + p1 * (-2.0 * f3 + 3.0 * f2)
                + m1 * (f3 - f2)
        }
    }
}

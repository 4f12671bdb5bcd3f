//! Collaborators the baker drives: animation evaluation and spatial transforms
//!
//! An [`AnimationEvaluator`] turns "clip + time" into deformed vertices. The
//! baker only ever walks time forward from zero in fixed steps, so the trait
//! mirrors that: `reset`, then repeated `advance` / `sample_*`.

use glam::{Affine3A, Mat3, Mat4, Vec3};
use std::ops::{Deref, DerefMut};
use vat_shared::ClipDescriptor;

use crate::error::EvalError;
use crate::mesh::Mesh;

/// Source of deformed vertex data for a clip.
///
/// Implementations must be deterministic: the same clip and the same sequence
/// of `advance` calls produce the same vertices.
pub trait AnimationEvaluator {
    /// Rewind to time 0 of `clip`, acquiring any per-clip evaluation state
    fn reset(&mut self, clip: &ClipDescriptor) -> Result<(), EvalError>;

    /// Move the current time forward
    fn advance(&mut self, delta_seconds: f32) -> Result<(), EvalError>;

    /// Deformed positions at the current time, in mesh space
    fn sample_vertices(&mut self) -> Result<Vec<Vec3>, EvalError>;

    /// Deformed normals at the current time, in mesh space
    fn sample_normals(&mut self) -> Result<Vec<Vec3>, EvalError>;

    /// Normals of the rest pose in the same space as the sampled vertices.
    ///
    /// `None` means the source mesh normals already are in that space.
    fn rest_normals(&mut self) -> Result<Option<Vec<Vec3>>, EvalError> {
        Ok(None)
    }

    /// Drop per-clip evaluation state
    fn release(&mut self) {}
}

impl<E: AnimationEvaluator + ?Sized> AnimationEvaluator for &mut E {
    fn reset(&mut self, clip: &ClipDescriptor) -> Result<(), EvalError> {
        (**self).reset(clip)
    }

    fn advance(&mut self, delta_seconds: f32) -> Result<(), EvalError> {
        (**self).advance(delta_seconds)
    }

    fn sample_vertices(&mut self) -> Result<Vec<Vec3>, EvalError> {
        (**self).sample_vertices()
    }

    fn sample_normals(&mut self) -> Result<Vec<Vec3>, EvalError> {
        (**self).sample_normals()
    }

    fn rest_normals(&mut self) -> Result<Option<Vec<Vec3>>, EvalError> {
        (**self).rest_normals()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Evaluation context for one clip, released when dropped.
///
/// Release happens on every exit path, including early returns through `?`
/// and panics unwinding out of a frame callback.
pub struct EvaluationScope<'a, E: AnimationEvaluator + ?Sized> {
    evaluator: &'a mut E,
}

impl<'a, E: AnimationEvaluator + ?Sized> EvaluationScope<'a, E> {
    /// Reset `evaluator` to the start of `clip`
    pub fn begin(evaluator: &'a mut E, clip: &ClipDescriptor) -> Result<Self, EvalError> {
        if let Err(err) = evaluator.reset(clip) {
            evaluator.release();
            return Err(err);
        }
        Ok(Self { evaluator })
    }
}

impl<E: AnimationEvaluator + ?Sized> Deref for EvaluationScope<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &*self.evaluator
    }
}

impl<E: AnimationEvaluator + ?Sized> DerefMut for EvaluationScope<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut *self.evaluator
    }
}

impl<E: AnimationEvaluator + ?Sized> Drop for EvaluationScope<'_, E> {
    fn drop(&mut self) {
        self.evaluator.release();
    }
}

/// Evaluator for meshes without a deformation source: every frame is the bind pose
#[derive(Debug, Clone)]
pub struct StaticPose {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl StaticPose {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
        Self { positions, normals }
    }

    pub fn from_mesh(mesh: &Mesh) -> Self {
        let normals = mesh
            .normals
            .clone()
            .unwrap_or_else(|| vec![Vec3::Y; mesh.vertex_count()]);
        Self::new(mesh.positions.clone(), normals)
    }
}

impl AnimationEvaluator for StaticPose {
    fn reset(&mut self, _clip: &ClipDescriptor) -> Result<(), EvalError> {
        Ok(())
    }

    fn advance(&mut self, _delta_seconds: f32) -> Result<(), EvalError> {
        Ok(())
    }

    fn sample_vertices(&mut self) -> Result<Vec<Vec3>, EvalError> {
        Ok(self.positions.clone())
    }

    fn sample_normals(&mut self) -> Result<Vec<Vec3>, EvalError> {
        Ok(self.normals.clone())
    }
}

/// Maps mesh-space data into the space the texture is baked in
pub trait SpatialTransform {
    fn transform_point(&self, point: Vec3) -> Vec3;

    /// Transform a surface direction (normals); the result is unit length
    fn transform_direction(&self, direction: Vec3) -> Vec3;
}

impl<T: SpatialTransform + ?Sized> SpatialTransform for &T {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        (**self).transform_point(point)
    }

    fn transform_direction(&self, direction: Vec3) -> Vec3 {
        (**self).transform_direction(direction)
    }
}

/// No-op transform used when none is supplied
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl SpatialTransform for Identity {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        point
    }

    fn transform_direction(&self, direction: Vec3) -> Vec3 {
        direction
    }
}

impl SpatialTransform for Affine3A {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        self.transform_point3(point)
    }

    fn transform_direction(&self, direction: Vec3) -> Vec3 {
        // Inverse-transpose keeps normals perpendicular under non-uniform scale
        let normal_matrix = Mat3::from(self.matrix3).inverse().transpose();
        (normal_matrix * direction).normalize_or_zero()
    }
}

impl SpatialTransform for Mat4 {
    fn transform_point(&self, point: Vec3) -> Vec3 {
        self.transform_point3(point)
    }

    fn transform_direction(&self, direction: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * direction).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[derive(Default)]
    struct CountingEvaluator {
        resets: u32,
        releases: u32,
        fail_reset: bool,
    }

    impl AnimationEvaluator for CountingEvaluator {
        fn reset(&mut self, _clip: &ClipDescriptor) -> Result<(), EvalError> {
            self.resets += 1;
            if self.fail_reset {
                return Err("no such clip".into());
            }
            Ok(())
        }

        fn advance(&mut self, _delta_seconds: f32) -> Result<(), EvalError> {
            Ok(())
        }

        fn sample_vertices(&mut self) -> Result<Vec<Vec3>, EvalError> {
            Ok(Vec::new())
        }

        fn sample_normals(&mut self) -> Result<Vec<Vec3>, EvalError> {
            Ok(Vec::new())
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    #[test]
    fn test_scope_releases_on_drop() {
        let clip = ClipDescriptor::new("a", 1.0, 10.0);
        let mut evaluator = CountingEvaluator::default();
        {
            let mut scope = EvaluationScope::begin(&mut evaluator, &clip).unwrap();
            scope.advance(0.1).unwrap();
        }
        assert_eq!(evaluator.resets, 1);
        assert_eq!(evaluator.releases, 1);
    }

    #[test]
    fn test_scope_releases_when_reset_fails() {
        let clip = ClipDescriptor::new("a", 1.0, 10.0);
        let mut evaluator = CountingEvaluator {
            fail_reset: true,
            ..Default::default()
        };
        assert!(EvaluationScope::begin(&mut evaluator, &clip).is_err());
        assert_eq!(evaluator.releases, 1);
    }

    #[test]
    fn test_affine_transform() {
        let t = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 0.0, 0.0),
        );
        let p = t.transform_point(Vec3::X);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);

        let n = t.transform_direction(Vec3::X);
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_normals_under_non_uniform_scale() {
        let t = Affine3A::from_scale(Vec3::new(4.0, 1.0, 1.0));
        // Normal of the plane x = y stays perpendicular to the scaled plane
        let n = t.transform_direction(Vec3::new(1.0, -1.0, 0.0).normalize());
        let tangent = t.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        assert!(n.dot(tangent).abs() < 1e-5);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Identity.transform_point(p), p);
        assert_eq!(Identity.transform_direction(p), p);
    }
}

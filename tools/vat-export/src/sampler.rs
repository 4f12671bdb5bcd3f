//! Fixed-rate clip sampling
//!
//! Frame `i` of a clip is sampled at `i / frame_rate` for
//! `i in 0..clip.frame_count()`, the same count the layout planner reserves.

use glam::Vec3;
use vat_shared::ClipDescriptor;

use crate::error::{BakeError, BakeResult};
use crate::evaluator::{AnimationEvaluator, EvaluationScope};

/// Drives an evaluator through a clip one frame at a time
pub struct FrameSampler<'a, E: AnimationEvaluator + ?Sized> {
    evaluator: &'a mut E,
}

impl<'a, E: AnimationEvaluator + ?Sized> FrameSampler<'a, E> {
    pub fn new(evaluator: &'a mut E) -> Self {
        Self { evaluator }
    }

    /// Call `callback(frame_index, vertices)` for every frame of `clip`, in order.
    ///
    /// The evaluation context is acquired before the first frame and released
    /// on return, whether the loop finished or `callback` failed.
    /// Returns the number of frames visited.
    pub fn for_each_frame<F>(&mut self, clip: &ClipDescriptor, mut callback: F) -> BakeResult<u32>
    where
        F: FnMut(u32, &[Vec3]) -> BakeResult<()>,
    {
        let frame_count = clip.frame_count();
        let delta = clip.frame_delta();

        let mut scope = EvaluationScope::begin(&mut *self.evaluator, clip)
            .map_err(|e| BakeError::evaluation(&clip.name, 0, e))?;

        let mut expected_len = None;
        for frame in 0..frame_count {
            if frame > 0 {
                scope
                    .advance(delta)
                    .map_err(|e| BakeError::evaluation(&clip.name, frame, e))?;
            }

            let vertices = scope
                .sample_vertices()
                .map_err(|e| BakeError::evaluation(&clip.name, frame, e))?;

            match expected_len {
                None => expected_len = Some(vertices.len()),
                Some(len) if len != vertices.len() => {
                    return Err(BakeError::evaluation(
                        &clip.name,
                        frame,
                        format!(
                            "vertex count changed from {} to {}",
                            len,
                            vertices.len()
                        ),
                    ));
                }
                Some(_) => {}
            }

            callback(frame, &vertices)?;
        }

        tracing::debug!(
            "Sampled clip '{}': {} frames at {} fps",
            clip.name,
            frame_count,
            clip.frame_rate
        );

        Ok(frame_count)
    }

    /// Normals at time 0 of `clip`
    pub fn normals_at_start(&mut self, clip: &ClipDescriptor) -> BakeResult<Vec<Vec3>> {
        let mut scope = EvaluationScope::begin(&mut *self.evaluator, clip)
            .map_err(|e| BakeError::evaluation(&clip.name, 0, e))?;
        scope
            .sample_normals()
            .map_err(|e| BakeError::evaluation(&clip.name, 0, e))
    }
}

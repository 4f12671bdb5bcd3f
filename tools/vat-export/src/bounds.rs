//! Bounding box pass
//!
//! Walks every clip with the same frame stepping as the texture pass and folds
//! every transformed vertex into one box, so the texture pass can normalize
//! against bounds that contain all of its inputs.

use vat_shared::{BoundingBox, ClipDescriptor};

use crate::error::{BakeError, BakeResult};
use crate::evaluator::{AnimationEvaluator, SpatialTransform};
use crate::sampler::FrameSampler;

/// Compute bounds over all frames of `clips`, in `transform` space.
///
/// Fails with [`BakeError::InvalidInput`] for an empty clip list or when no
/// vertex was sampled at all; never returns the infinite sentinel box.
pub fn compute_bounds<E, T>(
    clips: &[ClipDescriptor],
    evaluator: &mut E,
    transform: &T,
) -> BakeResult<BoundingBox>
where
    E: AnimationEvaluator + ?Sized,
    T: SpatialTransform + ?Sized,
{
    if clips.is_empty() {
        return Err(BakeError::InvalidInput(
            "cannot compute bounds without clips".to_string(),
        ));
    }

    let mut bounds = BoundingBox::EMPTY;
    let mut sampler = FrameSampler::new(evaluator);

    for clip in clips {
        sampler.for_each_frame(clip, |_, vertices| {
            for &v in vertices {
                bounds.expand(transform.transform_point(v));
            }
            Ok(())
        })?;
    }

    if bounds.is_empty() {
        return Err(BakeError::InvalidInput(
            "no bounding box producible: clips yielded no vertices".to_string(),
        ));
    }

    tracing::debug!(
        "Computed bounds over {} clips: min {:?}, max {:?}",
        clips.len(),
        bounds.min,
        bounds.max
    );

    Ok(bounds)
}

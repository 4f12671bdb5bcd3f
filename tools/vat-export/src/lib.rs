//! vat-export library
//!
//! Bakes animated meshes into vertex animation textures: one texture row per
//! sampled frame, one column per vertex, plus a lookup mesh whose UVs address
//! the columns. Runtime-facing types (bounds, clip layout, blending) live in
//! `vat-shared`.

pub mod bake;
pub mod bounds;
pub mod error;
pub mod evaluator;
pub mod formats;
pub mod import;
pub mod manifest;
pub mod mesh;
pub mod output;
pub mod sampler;
pub mod texture;

pub use bake::{BakeOutput, BakeSession};
pub use bounds::compute_bounds;
pub use error::{BakeError, BakeResult, EvalError};
pub use evaluator::{AnimationEvaluator, EvaluationScope, Identity, SpatialTransform, StaticPose};
pub use import::{GltfEvaluator, GltfScene};
pub use manifest::Manifest;
pub use mesh::{annotate, Mesh};
pub use sampler::FrameSampler;
pub use texture::{assemble, AnimationTexture, TextureAssembler};

// Re-export the runtime-facing types so callers need only one crate
pub use vat_shared::{
    BoundingBox, ClipBlender, ClipDescriptor, ClipLayoutEntry, ClipWrapMode, MultiClipLayout,
    TextureWrap,
};

//! Shared types for vertex animation textures.
//!
//! Everything a renderer needs to play back a baked texture: the bounding box
//! that decodes texel colors, the per-clip row layout, and the two-clip blend
//! driver. The baker in `vat-export` produces these; nothing here samples
//! animation.

pub mod blend;
pub mod clip;
pub mod layout;
pub mod math;

pub use blend::{BlendParams, ClipBlender};
pub use clip::{ClipDescriptor, ClipWrapMode};
pub use layout::{ClipLayoutEntry, LayoutError, MultiClipLayout, TextureWrap};
pub use math::{BoundingBox, BoundsError, BoundsUniforms};

/// Number of UV channels a lookup mesh can carry
pub const MAX_UV_CHANNELS: usize = 4;

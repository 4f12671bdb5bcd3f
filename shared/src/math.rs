//! Bounding volume used to normalize baked vertex positions
//!
//! Texels in a vertex animation texture store positions relative to this box,
//! so values stay in `[0, 1]` and survive 8-bit or half-float storage. The same
//! box is handed to the renderer to map texel colors back to object space.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis names for error reporting
const AXIS_NAMES: [char; 3] = ['x', 'y', 'z'];

/// Error type for bounding boxes that cannot be used for normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("no bounding box producible: no vertices were sampled")]
    Empty,

    #[error("bounding box has non-finite components (min {min:?}, max {max:?})")]
    NonFinite { min: [f32; 3], max: [f32; 3] },

    #[error("bounding box is degenerate on the {axis} axis (min == max == {value})")]
    Degenerate { axis: char, value: f32 },
}

/// Axis-aligned bounding box
///
/// Starts out as [`BoundingBox::EMPTY`] (`min = +inf`, `max = -inf`) and is grown
/// with [`BoundingBox::expand`] during a bounds pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    /// Sentinel box that any point expands
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Grow the box to contain `point`
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box to contain every point in `points`
    pub fn expand_all(&mut self, points: &[Vec3]) {
        for &p in points {
            self.expand(p);
        }
    }

    /// True while no point has been folded in
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        self.min + self.extents() * 0.5
    }

    /// Check that the box can be used to normalize positions.
    ///
    /// Rejects the empty sentinel, infinite or NaN components, and zero extent
    /// on any axis (which would divide by zero in [`Self::to_relative_position`]).
    pub fn validate(&self) -> Result<(), BoundsError> {
        if self.is_empty() {
            return Err(BoundsError::Empty);
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(BoundsError::NonFinite {
                min: self.min.to_array(),
                max: self.max.to_array(),
            });
        }
        let extents = self.extents();
        for (axis, &name) in AXIS_NAMES.iter().enumerate() {
            if extents[axis] <= 0.0 {
                return Err(BoundsError::Degenerate {
                    axis: name,
                    value: self.min[axis],
                });
            }
        }
        Ok(())
    }

    /// Map a position into the box's `[0, 1]` space (component-wise inverse lerp).
    ///
    /// Values are not clamped: points outside the box map outside `[0, 1]`.
    pub fn to_relative_position(&self, position: Vec3) -> Vec3 {
        (position - self.min) / self.extents()
    }

    /// Inverse of [`Self::to_relative_position`]
    pub fn to_absolute_position(&self, relative: Vec3) -> Vec3 {
        self.min + relative * self.extents()
    }

    /// Material parameters for shader-side decoding
    pub fn shader_uniforms(&self) -> BoundsUniforms {
        BoundsUniforms {
            min_bounds: self.min.extend(0.0).to_array(),
            max_bounds: self.max.extend(0.0).to_array(),
        }
    }
}

/// GPU-ready bounds block (`_MinBounds` / `_MaxBounds`)
///
/// Memory layout (32 bytes): two vec4s, `w` unused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BoundsUniforms {
    pub min_bounds: [f32; 4],
    pub max_bounds: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 4.0, 3.0))
    }

    #[test]
    fn test_empty_sentinel() {
        let bb = BoundingBox::default();
        assert!(bb.is_empty());
        assert_eq!(bb.validate(), Err(BoundsError::Empty));
    }

    #[test]
    fn test_expand() {
        let mut bb = BoundingBox::EMPTY;
        bb.expand_all(&[Vec3::new(1.0, -2.0, 0.5), Vec3::new(-3.0, 4.0, 0.0)]);
        assert_eq!(bb.min, Vec3::new(-3.0, -2.0, 0.0));
        assert_eq!(bb.max, Vec3::new(1.0, 4.0, 0.5));
        assert!(!bb.is_empty());
        assert!(bb.validate().is_ok());
    }

    #[test]
    fn test_extents_and_center() {
        let bb = unit_box();
        assert_eq!(bb.extents(), Vec3::new(2.0, 4.0, 1.0));
        assert_eq!(bb.center(), Vec3::new(0.0, 2.0, 2.5));
    }

    #[test]
    fn test_relative_position() {
        let bb = unit_box();
        assert_eq!(bb.to_relative_position(bb.min), Vec3::ZERO);
        assert_eq!(bb.to_relative_position(bb.max), Vec3::ONE);
        assert_eq!(bb.to_relative_position(bb.center()), Vec3::splat(0.5));
    }

    #[test]
    fn test_relative_position_not_clamped() {
        let bb = unit_box();
        let rel = bb.to_relative_position(Vec3::new(3.0, -4.0, 2.5));
        assert_eq!(rel, Vec3::new(2.0, -1.0, 0.5));
    }

    #[test]
    fn test_absolute_roundtrip() {
        let bb = unit_box();
        let p = Vec3::new(0.25, 1.5, 2.75);
        let back = bb.to_absolute_position(bb.to_relative_position(p));
        assert!((back - p).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_degenerate_axis_rejected() {
        let bb = BoundingBox::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(
            bb.validate(),
            Err(BoundsError::Degenerate {
                axis: 'y',
                value: 1.0
            })
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let bb = BoundingBox::new(Vec3::new(0.0, f32::NEG_INFINITY, 0.0), Vec3::ONE);
        assert!(matches!(bb.validate(), Err(BoundsError::NonFinite { .. })));
    }

    #[test]
    fn test_shader_uniforms_layout() {
        let u = unit_box().shader_uniforms();
        assert_eq!(u.min_bounds, [-1.0, 0.0, 2.0, 0.0]);
        assert_eq!(u.max_bounds, [1.0, 4.0, 3.0, 0.0]);
        assert_eq!(bytemuck::bytes_of(&u).len(), 32);
    }

    #[test]
    fn test_json_roundtrip() {
        let bb = unit_box();
        let json = serde_json::to_string(&bb).unwrap();
        let parsed: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bb);
    }
}

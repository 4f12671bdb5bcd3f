//! Runtime blending between two clips packed into the same texture
//!
//! The shader samples the texture twice, once per clip, and mixes the decoded
//! positions with `blend`. This module only drives the three parameters.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::layout::{LayoutError, MultiClipLayout};

/// Blend weights this close to 0 or 1 park the inactive clip at phase 0
const BLEND_EPSILON: f32 = f32::EPSILON;

/// Shader parameters for one blended draw (`_ClipTimeA`, `_ClipTimeB`, `_Blend`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct BlendParams {
    pub clip_time_a: f32,
    pub clip_time_b: f32,
    pub blend: f32,
    pub _padding: f32,
}

/// Two-clip playback state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipBlender {
    pub clip_a: usize,
    pub clip_b: usize,
    /// Phase units per second (1.0 plays a whole clip each second)
    pub speed: f32,
    blend: f32,
    phase_a: f32,
    phase_b: f32,
}

impl ClipBlender {
    pub fn new(clip_a: usize, clip_b: usize, speed: f32) -> Self {
        Self {
            clip_a,
            clip_b,
            speed,
            blend: 0.0,
            phase_a: 0.0,
            phase_b: 0.0,
        }
    }

    /// Select both clips by name
    pub fn for_clips(
        layout: &MultiClipLayout,
        clip_a: &str,
        clip_b: &str,
        speed: f32,
    ) -> Result<Self, LayoutError> {
        let index_of = |name: &str| {
            layout
                .entries
                .iter()
                .position(|e| e.clip.name == name)
                .ok_or_else(|| LayoutError::UnknownClip(name.to_string()))
        };
        Ok(Self::new(index_of(clip_a)?, index_of(clip_b)?, speed))
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Weight of clip B, clamped to `[0, 1]`
    pub fn set_blend(&mut self, blend: f32) {
        self.blend = blend.clamp(0.0, 1.0);
    }

    pub fn phases(&self) -> (f32, f32) {
        (self.phase_a, self.phase_b)
    }

    /// Advance both phases by `delta_seconds` and produce shader parameters.
    pub fn update(
        &mut self,
        layout: &MultiClipLayout,
        delta_seconds: f32,
    ) -> Result<BlendParams, LayoutError> {
        let step = delta_seconds * self.speed;
        self.phase_a = (self.phase_a + step).rem_euclid(1.0);
        self.phase_b = (self.phase_b + step).rem_euclid(1.0);

        if self.blend < BLEND_EPSILON {
            self.phase_b = 0.0;
        }
        if self.blend > 1.0 - BLEND_EPSILON {
            self.phase_a = 0.0;
        }

        self.params(layout)
    }

    /// Shader parameters for the current phases, without advancing time
    pub fn params(&self, layout: &MultiClipLayout) -> Result<BlendParams, LayoutError> {
        let a = layout.entry(self.clip_a)?;
        let b = layout.entry(self.clip_b)?;
        Ok(BlendParams {
            clip_time_a: a.time_at_phase(self.phase_a),
            clip_time_b: b.time_at_phase(self.phase_b),
            blend: self.blend,
            _padding: 0.0,
        })
    }
}

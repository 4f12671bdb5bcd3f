//! Animation clip descriptors
//!
//! The baker never looks inside a clip; it only needs the clip's name, duration,
//! sample rate and wrap mode to plan texture rows and pick a sampler wrap mode.

use serde::{Deserialize, Serialize};

/// Playback wrap mode of a source clip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipWrapMode {
    /// Play once and stop
    #[default]
    #[serde(alias = "clamp")]
    Once,
    /// Restart from the beginning after the last frame
    #[serde(alias = "repeat")]
    Loop,
    /// Alternate forward and backward
    #[serde(alias = "pingpong")]
    PingPong,
    /// Hold the last frame forever
    ClampForever,
}

/// Read-only description of an animation clip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipDescriptor {
    /// Clip name, used to address the clip in layout metadata
    pub name: String,
    /// Duration in seconds
    pub length: f32,
    /// Sample rate in Hz
    pub frame_rate: f32,
    #[serde(default)]
    pub wrap_mode: ClipWrapMode,
}

impl ClipDescriptor {
    pub fn new(name: impl Into<String>, length: f32, frame_rate: f32) -> Self {
        Self {
            name: name.into(),
            length,
            frame_rate,
            wrap_mode: ClipWrapMode::Once,
        }
    }

    pub fn with_wrap_mode(mut self, wrap_mode: ClipWrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    /// Number of sampled frames: `ceil(length * frame_rate)`.
    ///
    /// Frame `i` is sampled at `i / frame_rate`, so every frame time is strictly
    /// less than `length`. Negative or non-finite products yield 0.
    pub fn frame_count(&self) -> u32 {
        let frames = (self.length * self.frame_rate).ceil();
        if frames.is_finite() && frames > 0.0 {
            frames as u32
        } else {
            0
        }
    }

    /// Seconds between two sampled frames
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.frame_rate
    }

    pub fn is_looping(&self) -> bool {
        self.wrap_mode == ClipWrapMode::Loop
    }
}

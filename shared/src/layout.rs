//! Multi-clip frame layout
//!
//! Several clips share one texture. Each clip owns a contiguous block of rows
//! and adjacent clips are separated by a seam row that repeats the previous
//! clip's last frame, so bilinear filtering never blends two different clips.
//!
//! # Layout
//! ```text
//! row 0            clip 0, frame 0
//! ...
//! row n0 - 1       clip 0, frame n0 - 1
//! row n0           seam (copy of row n0 - 1)
//! row n0 + 1       clip 1, frame 0
//! ...
//! ```
//!
//! Normalized times address texel centers: a clip spans
//! `[(start + 0.5) / total, (start + 0.5 + count - 1) / total]`, so sweeping
//! the full range lands on the first and last sampled frame exactly.

use serde::{Deserialize, Serialize};

use crate::clip::ClipDescriptor;

/// Error type for layout planning and addressing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("at least one clip must be provided")]
    EmptyClipList,

    #[error("clip '{name}': {reason}")]
    InvalidClip { name: String, reason: String },

    #[error("clip index {index} out of range ({count} clips)")]
    ClipIndexOutOfRange { index: usize, count: usize },

    #[error("clip '{0}' is not part of this layout")]
    UnknownClip(String),
}

/// Texture sampler wrap mode for the baked texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureWrap {
    Repeat,
    Clamp,
}

/// Placement of one clip inside the packed texture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipLayoutEntry {
    pub clip: ClipDescriptor,
    /// First texture row of this clip
    pub start_frame: u32,
    /// Number of rows sampled from the clip
    pub frame_count: u32,
    pub fps: f32,
    pub normalized_start_time: f32,
    pub normalized_duration: f32,
}

impl ClipLayoutEntry {
    pub fn clip_name(&self) -> &str {
        &self.clip.name
    }

    /// Last texture row of this clip (inclusive)
    pub fn end_frame(&self) -> u32 {
        self.start_frame + self.frame_count - 1
    }

    /// Row range `[start_frame, start_frame + frame_count)`
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.start_frame..self.start_frame + self.frame_count
    }

    pub fn normalized_end_time(&self) -> f32 {
        self.normalized_start_time + self.normalized_duration
    }

    /// Normalized texture time for a playback phase in `[0, 1]`
    pub fn time_at_phase(&self, phase: f32) -> f32 {
        let (start, end) = (self.normalized_start_time, self.normalized_end_time());
        start + (end - start) * phase
    }
}

/// Ordered clip placements plus the total texture height
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiClipLayout {
    pub entries: Vec<ClipLayoutEntry>,
    pub total_frame_count: u32,
}

impl MultiClipLayout {
    /// Plan row placement for `clips`, in order.
    ///
    /// Fails when `clips` is empty, a clip would occupy no rows, or the rows
    /// do not fit in a `u32`.
    pub fn plan(clips: &[ClipDescriptor]) -> Result<Self, LayoutError> {
        if clips.is_empty() {
            return Err(LayoutError::EmptyClipList);
        }

        let mut entries = Vec::with_capacity(clips.len());
        let mut start_frame = 0u32;

        for (i, clip) in clips.iter().enumerate() {
            validate_clip(clip)?;
            let frame_count = clip.frame_count();

            entries.push(ClipLayoutEntry {
                clip: clip.clone(),
                start_frame,
                frame_count,
                fps: clip.frame_rate,
                normalized_start_time: 0.0,
                normalized_duration: 0.0,
            });

            let seam = u32::from(i + 1 < clips.len());
            start_frame = start_frame
                .checked_add(frame_count)
                .and_then(|rows| rows.checked_add(seam))
                .ok_or_else(|| LayoutError::InvalidClip {
                    name: clip.name.clone(),
                    reason: "layout exceeds u32 rows".to_string(),
                })?;
        }

        let total_frame_count = start_frame;
        let total = total_frame_count as f32;
        for entry in &mut entries {
            entry.normalized_start_time = (entry.start_frame as f32 + 0.5) / total;
            entry.normalized_duration = (entry.frame_count as f32 - 1.0) / total;
        }

        Ok(Self {
            entries,
            total_frame_count,
        })
    }

    /// Re-derive the layout from the clips it already holds.
    ///
    /// Only metadata is recomputed; a texture baked from an older clip list is
    /// not updated.
    pub fn recompute(&self) -> Result<Self, LayoutError> {
        Self::plan(&self.clips())
    }

    pub fn clips(&self) -> Vec<ClipDescriptor> {
        self.entries.iter().map(|e| e.clip.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Result<&ClipLayoutEntry, LayoutError> {
        self.entries
            .get(index)
            .ok_or(LayoutError::ClipIndexOutOfRange {
                index,
                count: self.entries.len(),
            })
    }

    pub fn entry_for_clip(&self, name: &str) -> Option<&ClipLayoutEntry> {
        self.entries.iter().find(|e| e.clip.name == name)
    }

    /// Rows that duplicate the previous clip's last frame
    pub fn seam_rows(&self) -> impl Iterator<Item = u32> + '_ {
        let last = self.entries.len().saturating_sub(1);
        self.entries[..last]
            .iter()
            .map(|e| e.start_frame + e.frame_count)
    }

    /// `Repeat` only for a single looping clip; seams make anything else clamp.
    pub fn texture_wrap(&self) -> TextureWrap {
        match self.entries.as_slice() {
            [only] if only.clip.is_looping() => TextureWrap::Repeat,
            _ => TextureWrap::Clamp,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn validate_clip(clip: &ClipDescriptor) -> Result<(), LayoutError> {
    let invalid = |reason: String| LayoutError::InvalidClip {
        name: clip.name.clone(),
        reason,
    };

    if !clip.frame_rate.is_finite() || clip.frame_rate <= 0.0 {
        return Err(invalid(format!(
            "frame rate must be positive, got {}",
            clip.frame_rate
        )));
    }
    if !clip.length.is_finite() || clip.length < 0.0 {
        return Err(invalid(format!(
            "length must be non-negative, got {}",
            clip.length
        )));
    }
    if clip.frame_count() == 0 {
        return Err(invalid(format!(
            "clip of {}s at {} fps produces no frames",
            clip.length, clip.frame_rate
        )));
    }
    Ok(())
}

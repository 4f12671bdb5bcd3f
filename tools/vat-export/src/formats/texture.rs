//! Vertex animation texture binary format (.vattex)
//!
//! POD format - no magic bytes.
//!
//! # Layout
//! ```text
//! 0x00: width u32          - vertex count
//! 0x04: height u32         - frame rows, seams included
//! 0x08: format u8          - 0 = RGBA8, 1 = RGB16F, 2 = RGB32F
//! 0x09: wrap u8            - 0 = clamp, 1 = repeat
//! 0x0A: padding (2 bytes)
//! 0x0C: texel data, row-major (width * height * bytes_per_texel)
//! ```
//!
//! RGBA8 stores unorm channels with alpha 255. Float formats store RGB only,
//! little-endian.

use half::f16;
use serde::{Deserialize, Serialize};
use vat_shared::TextureWrap;

/// Texel storage format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TextureFormat {
    #[default]
    Rgba8 = 0,
    Rgb16F = 1,
    Rgb32F = 2,
}

impl TextureFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Rgba8),
            1 => Some(Self::Rgb16F),
            2 => Some(Self::Rgb32F),
            _ => None,
        }
    }

    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb16F => 6,
            Self::Rgb32F => 12,
        }
    }

    /// Whether values outside `[0, 1]` survive encoding
    pub fn is_float(self) -> bool {
        !matches!(self, Self::Rgba8)
    }
}

/// Vertex animation texture header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct VatTextureHeader {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub wrap: TextureWrap,
}

impl VatTextureHeader {
    pub const SIZE: usize = 12;

    pub fn new(width: u32, height: u32, format: TextureFormat, wrap: TextureWrap) -> Self {
        Self {
            width,
            height,
            format,
            wrap,
        }
    }

    /// Size of the texel data following the header
    pub fn data_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_le_bytes());
        bytes[8] = self.format as u8;
        bytes[9] = match self.wrap {
            TextureWrap::Clamp => 0,
            TextureWrap::Repeat => 1,
        };
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let wrap = match bytes[9] {
            0 => TextureWrap::Clamp,
            1 => TextureWrap::Repeat,
            _ => return None,
        };
        Some(Self {
            width: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            format: TextureFormat::from_u8(bytes[8])?,
            wrap,
        })
    }
}

/// Quantize a channel to 8 bits, clamped
pub fn encode_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn decode_unorm8(value: u8) -> f32 {
    value as f32 / 255.0
}

pub fn encode_f16(value: f32) -> [u8; 2] {
    f16::from_f32(value).to_le_bytes()
}

pub fn decode_f16(bytes: [u8; 2]) -> f32 {
    f16::from_le_bytes(bytes).to_f32()
}

//! Lookup mesh binary format (.vatmesh)
//!
//! POD format - no magic bytes.
//!
//! # Layout
//! ```text
//! 0x00: vertex_count u32
//! 0x04: index_count u32
//! 0x08: uv_mask u8          - bit i set when UV channel i is present
//! 0x09: lookup_channel u8   - channel holding the texture column lookups
//! 0x0A: flags u8            - bit 0: normals present
//! 0x0B: padding (1 byte)
//! 0x0C: positions  (vertex_count * 3 * f32)
//! var:  normals    (vertex_count * 3 * f32), if present
//! var:  uv channel (vertex_count * 2 * f32) for each set bit, ascending
//! var:  indices    (index_count * u32)
//! ```

use vat_shared::MAX_UV_CHANNELS;

/// Flag bit: normals follow the positions
pub const FLAG_NORMALS: u8 = 0x01;

/// Lookup mesh header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct VatMeshHeader {
    pub vertex_count: u32,
    pub index_count: u32,
    pub uv_mask: u8,
    pub lookup_channel: u8,
    pub flags: u8,
    pub _padding: u8,
}

impl VatMeshHeader {
    pub const SIZE: usize = 12;

    pub fn new(
        vertex_count: u32,
        index_count: u32,
        uv_mask: u8,
        lookup_channel: u8,
        flags: u8,
    ) -> Self {
        Self {
            vertex_count,
            index_count,
            uv_mask,
            lookup_channel,
            flags,
            _padding: 0,
        }
    }

    pub fn has_normals(&self) -> bool {
        self.flags & FLAG_NORMALS != 0
    }

    pub fn has_uv_channel(&self, channel: usize) -> bool {
        channel < MAX_UV_CHANNELS && self.uv_mask & (1 << channel) != 0
    }

    /// Size of the data following the header
    pub fn data_size(&self) -> usize {
        let vc = self.vertex_count as usize;
        let normals = if self.has_normals() { vc * 12 } else { 0 };
        let uvs = self.uv_mask.count_ones() as usize * vc * 8;
        vc * 12 + normals + uvs + self.index_count as usize * 4
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[8] = self.uv_mask;
        bytes[9] = self.lookup_channel;
        bytes[10] = self.flags;
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let header = Self {
            vertex_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            index_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            uv_mask: bytes[8],
            lookup_channel: bytes[9],
            flags: bytes[10],
            _padding: 0,
        };
        if header.uv_mask >> MAX_UV_CHANNELS != 0
            || !header.has_uv_channel(header.lookup_channel as usize)
        {
            return None;
        }
        Some(header)
    }
}

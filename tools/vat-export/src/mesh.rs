//! Source and lookup meshes
//!
//! The lookup mesh is the source mesh plus one UV channel that tells the
//! vertex shader which texture column holds each vertex, and normals replaced
//! by their transformed bind-pose values.

use glam::{Vec2, Vec3};
use vat_shared::MAX_UV_CHANNELS;

use crate::error::{BakeError, BakeResult};

/// Indexed triangle mesh with up to four UV channels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub uv_channels: [Option<Vec<Vec2>>; MAX_UV_CHANNELS],
    /// Triangle list; empty for non-indexed meshes
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            positions,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn uv_channel(&self, channel: usize) -> Option<&[Vec2]> {
        self.uv_channels.get(channel)?.as_deref()
    }
}

/// Texture coordinate addressing the center of `vertex_index`'s column, at `v = 1`
pub fn lookup_uv(vertex_index: usize, vertex_count: usize) -> Vec2 {
    Vec2::new((vertex_index as f32 + 0.5) / vertex_count as f32, 1.0)
}

/// Inverse of [`lookup_uv`]: texture column addressed by a lookup `u`
pub fn column_for_uv(u: f32, vertex_count: usize) -> usize {
    (u * vertex_count as f32 - 0.5).round().max(0.0) as usize
}

/// Fail with [`BakeError::InvalidChannel`] outside `0..MAX_UV_CHANNELS`
pub fn check_uv_channel(uv_channel: u32) -> BakeResult<usize> {
    let channel = uv_channel as usize;
    if channel >= MAX_UV_CHANNELS {
        return Err(BakeError::InvalidChannel(uv_channel));
    }
    Ok(channel)
}

/// Build the lookup mesh.
///
/// Copies `mesh`, writes column lookups into `uv_channel` and replaces the
/// normals with `normal_fn(i)` for every vertex. Positions, indices and the
/// other UV channels are left untouched.
pub fn annotate(
    mesh: &Mesh,
    vertex_count: usize,
    uv_channel: u32,
    mut normal_fn: impl FnMut(usize) -> Vec3,
) -> BakeResult<Mesh> {
    let channel = check_uv_channel(uv_channel)?;
    if vertex_count == 0 {
        return Err(BakeError::InvalidInput(format!(
            "mesh '{}' has no vertices",
            mesh.name
        )));
    }
    if vertex_count != mesh.vertex_count() {
        return Err(BakeError::InvalidInput(format!(
            "mesh '{}' has {} vertices, expected {}",
            mesh.name,
            mesh.vertex_count(),
            vertex_count
        )));
    }

    let mut lookup = mesh.clone();
    lookup.uv_channels[channel] = Some(
        (0..vertex_count)
            .map(|i| lookup_uv(i, vertex_count))
            .collect(),
    );
    lookup.normals = Some((0..vertex_count).map(&mut normal_fn).collect());
    Ok(lookup)
}

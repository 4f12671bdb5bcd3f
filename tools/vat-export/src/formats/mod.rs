//! Binary formats for baked artifacts
//!
//! POD formats with fixed little-endian headers. The reader side exists for
//! inspection and debugging (`vat-export decode`); engines read these
//! directly.

pub mod mesh;
pub mod texture;

pub use mesh::*;
pub use texture::*;

use anyhow::{bail, Context, Result};
use glam::{Vec2, Vec3};
use std::io::Write;
use vat_shared::MAX_UV_CHANNELS;

use crate::mesh::Mesh;
use crate::texture::AnimationTexture;

/// Write a complete vertex animation texture file
pub fn write_vat_texture<W: Write>(
    w: &mut W,
    texture: &AnimationTexture,
    format: TextureFormat,
) -> Result<()> {
    let header = VatTextureHeader::new(texture.width(), texture.height(), format, texture.wrap());
    w.write_all(&header.to_bytes())?;

    match format {
        TextureFormat::Rgba8 => {
            for t in texture.texels() {
                w.write_all(&[
                    encode_unorm8(t.x),
                    encode_unorm8(t.y),
                    encode_unorm8(t.z),
                    u8::MAX,
                ])?;
            }
        }
        TextureFormat::Rgb16F => {
            for t in texture.texels() {
                for c in t.to_array() {
                    w.write_all(&encode_f16(c))?;
                }
            }
        }
        TextureFormat::Rgb32F => {
            let floats: &[f32] = bytemuck::cast_slice(texture.texels());
            for f in floats {
                w.write_all(&f.to_le_bytes())?;
            }
        }
    }

    Ok(())
}

/// Encode a texture file into memory
pub fn encode_vat_texture(texture: &AnimationTexture, format: TextureFormat) -> Result<Vec<u8>> {
    let data_size = texture.texels().len() * format.bytes_per_texel();
    let mut bytes = Vec::with_capacity(VatTextureHeader::SIZE + data_size);
    write_vat_texture(&mut bytes, texture, format)?;
    Ok(bytes)
}

/// Parse a texture file back into linear texels
pub fn read_vat_texture(bytes: &[u8]) -> Result<(VatTextureHeader, AnimationTexture)> {
    let header = VatTextureHeader::from_bytes(bytes).context("Invalid texture header")?;
    let data = &bytes[VatTextureHeader::SIZE..];
    if data.len() != header.data_size() {
        bail!(
            "Texture data is {} bytes, header ({}x{} {:?}) needs {}",
            data.len(),
            header.width,
            header.height,
            header.format,
            header.data_size()
        );
    }

    let stride = header.format.bytes_per_texel();
    let texels = data
        .chunks_exact(stride)
        .map(|c| match header.format {
            TextureFormat::Rgba8 => {
                Vec3::new(decode_unorm8(c[0]), decode_unorm8(c[1]), decode_unorm8(c[2]))
            }
            TextureFormat::Rgb16F => Vec3::new(
                decode_f16([c[0], c[1]]),
                decode_f16([c[2], c[3]]),
                decode_f16([c[4], c[5]]),
            ),
            TextureFormat::Rgb32F => read_vec3(c),
        })
        .collect();

    let texture = AnimationTexture::from_texels(header.width, header.height, header.wrap, texels)?;
    Ok((header, texture))
}

/// Write a complete lookup mesh file
pub fn write_vat_mesh<W: Write>(w: &mut W, mesh: &Mesh, lookup_channel: u32) -> Result<()> {
    let vertex_count = mesh.vertex_count();
    if mesh.uv_channel(lookup_channel as usize).is_none() {
        bail!(
            "Mesh '{}' has no UV channel {} to use for lookups",
            mesh.name,
            lookup_channel
        );
    }

    let mut uv_mask = 0u8;
    for (channel, uvs) in mesh.uv_channels.iter().enumerate() {
        if let Some(uvs) = uvs {
            if uvs.len() != vertex_count {
                bail!(
                    "Mesh '{}' UV channel {} has {} entries for {} vertices",
                    mesh.name,
                    channel,
                    uvs.len(),
                    vertex_count
                );
            }
            uv_mask |= 1 << channel;
        }
    }

    let mut flags = 0u8;
    if let Some(normals) = &mesh.normals {
        if normals.len() != vertex_count {
            bail!(
                "Mesh '{}' has {} normals for {} vertices",
                mesh.name,
                normals.len(),
                vertex_count
            );
        }
        flags |= FLAG_NORMALS;
    }

    let header = VatMeshHeader::new(
        vertex_count as u32,
        mesh.indices.len() as u32,
        uv_mask,
        lookup_channel as u8,
        flags,
    );
    w.write_all(&header.to_bytes())?;

    write_vec3s(w, &mesh.positions)?;
    if let Some(normals) = &mesh.normals {
        write_vec3s(w, normals)?;
    }
    for uvs in mesh.uv_channels.iter().flatten() {
        for uv in uvs {
            w.write_all(&uv.x.to_le_bytes())?;
            w.write_all(&uv.y.to_le_bytes())?;
        }
    }
    for i in &mesh.indices {
        w.write_all(&i.to_le_bytes())?;
    }

    Ok(())
}

/// Encode a lookup mesh file into memory
pub fn encode_vat_mesh(mesh: &Mesh, lookup_channel: u32) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_vat_mesh(&mut bytes, mesh, lookup_channel)?;
    Ok(bytes)
}

/// Parse a lookup mesh file. The mesh name is not stored and comes back empty.
pub fn read_vat_mesh(bytes: &[u8]) -> Result<(VatMeshHeader, Mesh)> {
    let header = VatMeshHeader::from_bytes(bytes).context("Invalid mesh header")?;
    let data = &bytes[VatMeshHeader::SIZE..];
    if data.len() != header.data_size() {
        bail!(
            "Mesh data is {} bytes, header needs {}",
            data.len(),
            header.data_size()
        );
    }

    let vc = header.vertex_count as usize;
    let mut reader = ByteReader { data, offset: 0 };

    let mut mesh = Mesh {
        positions: read_vec3s(reader.take(vc * 12)),
        ..Default::default()
    };
    if header.has_normals() {
        mesh.normals = Some(read_vec3s(reader.take(vc * 12)));
    }
    for channel in 0..MAX_UV_CHANNELS {
        if header.has_uv_channel(channel) {
            let uvs = reader
                .take(vc * 8)
                .chunks_exact(8)
                .map(|c| Vec2::new(read_f32(&c[0..4]), read_f32(&c[4..8])))
                .collect();
            mesh.uv_channels[channel] = Some(uvs);
        }
    }
    mesh.indices = reader
        .take(header.index_count as usize * 4)
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok((header, mesh))
}

/// Sequential slicing over data whose total size was already checked
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        slice
    }
}

fn write_vec3s<W: Write>(w: &mut W, values: &[Vec3]) -> Result<()> {
    for v in values {
        for c in v.to_array() {
            w.write_all(&c.to_le_bytes())?;
        }
    }
    Ok(())
}

fn read_vec3s(bytes: &[u8]) -> Vec<Vec3> {
    bytes
        .chunks_exact(12)
        .map(read_vec3)
        .collect()
}

fn read_vec3(bytes: &[u8]) -> Vec3 {
    Vec3::new(
        read_f32(&bytes[0..4]),
        read_f32(&bytes[4..8]),
        read_f32(&bytes[8..12]),
    )
}

fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::annotate;
    use vat_shared::TextureWrap;

    fn texture() -> AnimationTexture {
        let texels = vec![
            Vec3::new(0.0, 0.5, 1.0),
            Vec3::new(0.25, 0.75, 0.125),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.5, 0.5, 0.5),
        ];
        AnimationTexture::from_texels(2, 2, TextureWrap::Repeat, texels).unwrap()
    }

    #[test]
    fn test_texture_float_formats_exact() {
        let original = texture();
        for format in [TextureFormat::Rgb16F, TextureFormat::Rgb32F] {
            let bytes = encode_vat_texture(&original, format).unwrap();
            assert_eq!(bytes.len(), VatTextureHeader::SIZE + 4 * format.bytes_per_texel());

            let (header, decoded) = read_vat_texture(&bytes).unwrap();
            assert_eq!(header.format, format);
            // Every test value is representable in f16
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_texture_rgba8_alpha_opaque() {
        let bytes = encode_vat_texture(&texture(), TextureFormat::Rgba8).unwrap();
        let data = &bytes[VatTextureHeader::SIZE..];
        assert_eq!(&data[0..4], &[0, 128, 255, 255]);
        assert!(data.chunks_exact(4).all(|p| p[3] == 255));

        let (_, decoded) = read_vat_texture(&bytes).unwrap();
        assert_eq!(decoded.wrap(), TextureWrap::Repeat);
        for (d, o) in decoded.texels().iter().zip(texture().texels()) {
            assert!((*d - *o).abs().max_element() <= 0.5 / 255.0 + 1e-6);
        }
    }

    #[test]
    fn test_truncated_texture_rejected() {
        let bytes = encode_vat_texture(&texture(), TextureFormat::Rgb32F).unwrap();
        assert!(read_vat_texture(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_mesh_roundtrip() {
        let mut source = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_normals(vec![Vec3::Z; 3])
            .with_indices(vec![0, 1, 2]);
        source.uv_channels[0] = Some(vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
        let lookup = annotate(&source, 3, 2, |_| Vec3::Z).unwrap();

        let bytes = encode_vat_mesh(&lookup, 2).unwrap();
        let (header, decoded) = read_vat_mesh(&bytes).unwrap();

        assert_eq!(header.lookup_channel, 2);
        assert_eq!(header.uv_mask, 0b0101);
        assert_eq!(decoded.positions, lookup.positions);
        assert_eq!(decoded.normals, lookup.normals);
        assert_eq!(decoded.uv_channels, lookup.uv_channels);
        assert_eq!(decoded.indices, lookup.indices);
    }

    #[test]
    fn test_mesh_without_lookup_channel() {
        let mesh = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(encode_vat_mesh(&mesh, 0).is_err());
    }
}

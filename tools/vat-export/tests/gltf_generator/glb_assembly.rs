//! GLB file assembly.

use gltf_json as json;

const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Append one chunk, padded to 4 bytes with `pad`
fn push_chunk(glb: &mut Vec<u8>, kind: u32, data: &[u8], pad: u8) {
    let padding = (4 - data.len() % 4) % 4;
    glb.extend_from_slice(&((data.len() + padding) as u32).to_le_bytes());
    glb.extend_from_slice(&kind.to_le_bytes());
    glb.extend_from_slice(data);
    glb.extend(std::iter::repeat_n(pad, padding));
}

/// Assemble the final GLB binary
pub(crate) fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let mut root = root.clone();
    root.buffers[0].byte_length = buffer_data.len().into();
    let json_string = json::serialize::to_string(&root).expect("Failed to serialize JSON");

    let mut glb = Vec::new();
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    // Total length, patched below
    glb.extend_from_slice(&0u32.to_le_bytes());

    push_chunk(&mut glb, CHUNK_JSON, json_string.as_bytes(), b' ');
    push_chunk(&mut glb, CHUNK_BIN, buffer_data, 0);

    let total = glb.len() as u32;
    glb[8..12].copy_from_slice(&total.to_le_bytes());
    glb
}

//! Programmatic GLB generation for integration tests.
//!
//! Generates a GLB file with:
//! - Skinned strip mesh (positions, normals, UVs, joints, weights, indices)
//! - 2-bone chain (Root -> Tip) with inverse bind matrices
//! - "Lift" (root translation) and "Bend" (tip rotation) animations
//!
//! A rigid variant leaves the strip unskinned under a rotated node.

mod binary_packing;
mod glb_assembly;
mod gltf_json;
mod mesh_data;

pub use mesh_data::{BEND_ANGLE, LIFT_HEIGHT, VERTEX_COUNT, strip_bind_positions};

use mesh_data::create_strip;

/// Generate the skinned strip GLB.
pub fn generate_strip_glb() -> Vec<u8> {
    let strip = create_strip();
    let packed = binary_packing::pack_binary_data(&strip);
    let root = gltf_json::build_gltf_json(&packed, true, None);
    glb_assembly::assemble_glb(&root, &packed.buffer)
}

/// Same strip and skeleton with no animations at all
pub fn generate_unanimated_glb() -> Vec<u8> {
    let strip = create_strip();
    let packed = binary_packing::pack_binary_data(&strip);
    let root = gltf_json::build_gltf_json(&packed, false, None);
    glb_assembly::assemble_glb(&root, &packed.buffer)
}

/// Unskinned strip whose node is rotated by the quaternion `rotation` (xyzw)
pub fn generate_rigid_glb(rotation: [f32; 4]) -> Vec<u8> {
    let strip = create_strip();
    let packed = binary_packing::pack_binary_data(&strip);
    let root = gltf_json::build_gltf_json(&packed, true, Some(rotation));
    glb_assembly::assemble_glb(&root, &packed.buffer)
}

//! GLTF JSON structure building.

use super::binary_packing::PackedData;
use super::mesh_data::SEGMENT_HEIGHT;
use gltf_json as json;
use json::validation::Checked::Valid;

const ROOT_NODE: u32 = 0;
const TIP_NODE: u32 = 1;
const MESH_NODE: u32 = 2;

fn node(name: &str) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation: None,
        skin: None,
        weights: None,
    }
}

/// One single-channel animation
fn animation(
    name: &str,
    times: u32,
    output: u32,
    target: u32,
    path: json::animation::Property,
) -> json::Animation {
    json::Animation {
        channels: vec![json::animation::Channel {
            sampler: json::Index::new(0),
            target: json::animation::Target {
                node: json::Index::new(target),
                path: Valid(path),
                extensions: Default::default(),
                extras: Default::default(),
            },
            extensions: Default::default(),
            extras: Default::default(),
        }],
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(name.to_string()),
        samplers: vec![json::animation::Sampler {
            input: json::Index::new(times),
            interpolation: Valid(json::animation::Interpolation::Linear),
            output: json::Index::new(output),
            extensions: Default::default(),
            extras: Default::default(),
        }],
    }
}

/// Build the GLTF JSON structure.
///
/// With `rigid_rotation` the strip node drops its skin and carries that
/// rest rotation instead, so it moves as one rigid piece.
pub(crate) fn build_gltf_json(
    packed: &PackedData,
    with_animations: bool,
    rigid_rotation: Option<[f32; 4]>,
) -> json::Root {
    let ids = &packed.ids;

    let nodes = vec![
        json::Node {
            children: Some(vec![json::Index::new(TIP_NODE)]),
            ..node("Root")
        },
        json::Node {
            translation: Some([0.0, SEGMENT_HEIGHT, 0.0]),
            ..node("Tip")
        },
        json::Node {
            mesh: Some(json::Index::new(0)),
            skin: match rigid_rotation {
                Some(_) => None,
                None => Some(json::Index::new(0)),
            },
            rotation: rigid_rotation.map(json::scene::UnitQuaternion),
            ..node("Strip")
        },
    ];

    let mut attributes = std::collections::BTreeMap::new();
    for (semantic, accessor) in [
        (json::mesh::Semantic::Positions, ids.positions),
        (json::mesh::Semantic::Normals, ids.normals),
        (json::mesh::Semantic::TexCoords(0), ids.uvs),
        (json::mesh::Semantic::Joints(0), ids.joints),
        (json::mesh::Semantic::Weights(0), ids.weights),
    ] {
        attributes.insert(Valid(semantic), json::Index::new(accessor));
    }

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Strip".to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(json::Index::new(ids.indices)),
            material: None,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    }];

    let skins = vec![json::Skin {
        extensions: Default::default(),
        extras: Default::default(),
        inverse_bind_matrices: Some(json::Index::new(ids.inverse_bind_matrices)),
        joints: vec![json::Index::new(ROOT_NODE), json::Index::new(TIP_NODE)],
        name: Some("Chain".to_string()),
        skeleton: Some(json::Index::new(ROOT_NODE)),
    }];

    let animations = if with_animations {
        vec![
            animation(
                "Lift",
                ids.times,
                ids.lift,
                ROOT_NODE,
                json::animation::Property::Translation,
            ),
            animation(
                "Bend",
                ids.times,
                ids.bend,
                TIP_NODE,
                json::animation::Property::Rotation,
            ),
        ]
    } else {
        Vec::new()
    };

    let scenes = vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("TestScene".to_string()),
        nodes: vec![json::Index::new(ROOT_NODE), json::Index::new(MESH_NODE)],
    }];

    // Byte length is set by assemble_glb
    let buffers = vec![json::Buffer {
        byte_length: 0u64.into(),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    }];

    json::Root {
        accessors: packed.accessors.clone(),
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("vat-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: packed.views.clone(),
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes,
        skins,
        textures: Vec::new(),
    }
}

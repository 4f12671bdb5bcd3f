//! Binary data packing for GLTF buffers.

use super::mesh_data::{StripData, bend_keys, compute_bounds, key_times, lift_keys};
use gltf_json as json;
use json::accessor::{ComponentType, Type};
use json::validation::Checked::Valid;

/// Accessor indices of everything in the packed buffer
pub(crate) struct Accessors {
    pub positions: u32,
    pub normals: u32,
    pub uvs: u32,
    pub joints: u32,
    pub weights: u32,
    pub indices: u32,
    pub inverse_bind_matrices: u32,
    pub times: u32,
    pub lift: u32,
    pub bend: u32,
}

pub(crate) struct PackedData {
    pub buffer: Vec<u8>,
    pub views: Vec<json::buffer::View>,
    pub accessors: Vec<json::Accessor>,
    pub ids: Accessors,
}

impl PackedData {
    /// Append `bytes` as a new view and describe it with one accessor
    fn push(
        &mut self,
        bytes: &[u8],
        count: usize,
        component: ComponentType,
        type_: Type,
        target: Option<json::buffer::Target>,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> u32 {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        while !self.buffer.len().is_multiple_of(4) {
            self.buffer.push(0);
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });

        let to_value =
            |v: Vec<f32>| json::Value::Array(v.into_iter().map(json::Value::from).collect());
        let (min, max) = match bounds {
            Some((min, max)) => (Some(to_value(min)), Some(to_value(max))),
            None => (None, None),
        };

        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });
        self.accessors.len() as u32 - 1
    }
}

/// Pack all binary data into a single buffer
pub(crate) fn pack_binary_data(strip: &StripData) -> PackedData {
    use json::buffer::Target::{ArrayBuffer, ElementArrayBuffer};

    let mut packed = PackedData {
        buffer: Vec::new(),
        views: Vec::new(),
        accessors: Vec::new(),
        ids: Accessors {
            positions: 0,
            normals: 0,
            uvs: 0,
            joints: 0,
            weights: 0,
            indices: 0,
            inverse_bind_matrices: 0,
            times: 0,
            lift: 0,
            bend: 0,
        },
    };
    let vertex_count = strip.positions.len();

    let (min, max) = compute_bounds(&strip.positions);
    packed.ids.positions = packed.push(
        bytemuck::cast_slice(&strip.positions),
        vertex_count,
        ComponentType::F32,
        Type::Vec3,
        Some(ArrayBuffer),
        Some((min.to_vec(), max.to_vec())),
    );
    packed.ids.normals = packed.push(
        bytemuck::cast_slice(&strip.normals),
        vertex_count,
        ComponentType::F32,
        Type::Vec3,
        Some(ArrayBuffer),
        None,
    );
    packed.ids.uvs = packed.push(
        bytemuck::cast_slice(&strip.uvs),
        vertex_count,
        ComponentType::F32,
        Type::Vec2,
        Some(ArrayBuffer),
        None,
    );
    packed.ids.joints = packed.push(
        bytemuck::cast_slice(&strip.joints),
        vertex_count,
        ComponentType::U8,
        Type::Vec4,
        Some(ArrayBuffer),
        None,
    );
    packed.ids.weights = packed.push(
        bytemuck::cast_slice(&strip.weights),
        vertex_count,
        ComponentType::F32,
        Type::Vec4,
        Some(ArrayBuffer),
        None,
    );
    packed.ids.indices = packed.push(
        bytemuck::cast_slice(&strip.indices),
        strip.indices.len(),
        ComponentType::U16,
        Type::Scalar,
        Some(ElementArrayBuffer),
        None,
    );
    packed.ids.inverse_bind_matrices = packed.push(
        bytemuck::cast_slice(&strip.inverse_bind_matrices),
        strip.inverse_bind_matrices.len(),
        ComponentType::F32,
        Type::Mat4,
        None,
        None,
    );

    let times = key_times();
    packed.ids.times = packed.push(
        bytemuck::cast_slice(&times),
        times.len(),
        ComponentType::F32,
        Type::Scalar,
        None,
        Some((vec![times[0]], vec![times[times.len() - 1]])),
    );
    let lift = lift_keys();
    packed.ids.lift = packed.push(
        bytemuck::cast_slice(&lift),
        lift.len(),
        ComponentType::F32,
        Type::Vec3,
        None,
        None,
    );
    let bend = bend_keys();
    packed.ids.bend = packed.push(
        bytemuck::cast_slice(&bend),
        bend.len(),
        ComponentType::F32,
        Type::Vec4,
        None,
        None,
    );

    packed
}

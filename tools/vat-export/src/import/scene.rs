//! glTF scene extraction
//!
//! Pulls everything the evaluator needs out of a glTF document up front: the
//! bake mesh, the node hierarchy with rest transforms, the skin binding and
//! every animation's channels. Nothing borrows the document afterwards.

use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use hashbrown::HashMap;
use std::path::Path;
use vat_shared::MAX_UV_CHANNELS;

use super::interpolate::{self, Interpolation};
use crate::mesh::Mesh;

/// Node rest pose and parent link
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Animated node property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    Translation,
    Rotation,
    Scale,
}

/// One animated property of one node
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub target: ChannelTarget,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Vec<Vec4>,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    /// Time of the last keyframe across all channels
    pub duration: f32,
    pub channels: Vec<Channel>,
}

/// Skin joints and per-vertex influences for the bake mesh
#[derive(Debug, Clone)]
pub struct SkinBinding {
    /// Node index of each joint
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
    pub vertex_joints: Vec<[u16; 4]>,
    pub vertex_weights: Vec<[f32; 4]>,
}

/// Mesh, hierarchy and animations of a glTF file
#[derive(Debug, Clone)]
pub struct GltfScene {
    pub mesh: Mesh,
    /// Node carrying the bake mesh
    pub mesh_node: usize,
    pub nodes: Vec<SceneNode>,
    /// Node indices with every parent before its children
    pub order: Vec<usize>,
    pub skin: Option<SkinBinding>,
    pub animations: Vec<Animation>,
    animation_index: HashMap<String, usize>,
}

impl GltfScene {
    /// Import a glTF/GLB file. `mesh_name` selects the mesh; the first mesh
    /// attached to a node is used when absent.
    pub fn load(path: &Path, mesh_name: Option<&str>) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;
        Self::from_document(&document, &buffers, mesh_name)
            .with_context(|| format!("Failed to import {:?}", path))
    }

    /// Import from an in-memory glTF/GLB
    pub fn from_slice(bytes: &[u8], mesh_name: Option<&str>) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).context("Failed to parse glTF data")?;
        Self::from_document(&document, &buffers, mesh_name)
    }

    fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        mesh_name: Option<&str>,
    ) -> Result<Self> {
        let nodes = read_nodes(document);
        let order = hierarchy_order(&nodes)?;

        let mesh_node = match mesh_name {
            Some(name) => document
                .nodes()
                .find(|n| n.mesh().is_some_and(|m| m.name() == Some(name)))
                .with_context(|| {
                    let available: Vec<_> = document.meshes().filter_map(|m| m.name()).collect();
                    format!(
                        "Mesh '{}' not found on any node. Available meshes: {:?}",
                        name, available
                    )
                })?,
            None => document
                .nodes()
                .find(|n| n.mesh().is_some())
                .context("No mesh nodes found in glTF")?,
        };
        let Some(gltf_mesh) = mesh_node.mesh() else {
            bail!("Node {} has no mesh", mesh_node.index());
        };

        let (mesh, influences) = read_mesh(&gltf_mesh, buffers)?;

        let skin = match (mesh_node.skin(), influences) {
            (Some(skin), Some((vertex_joints, vertex_weights))) => Some(read_skin(
                &skin,
                buffers,
                vertex_joints,
                vertex_weights,
            )?),
            (Some(_), None) => {
                tracing::warn!(
                    "Mesh '{}' has a skin but no JOINTS_0/WEIGHTS_0, ignoring skin",
                    mesh.name
                );
                None
            }
            _ => None,
        };

        let animations = document
            .animations()
            .map(|a| read_animation(&a, buffers))
            .collect::<Result<Vec<_>>>()?;
        let animation_index = animations
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();

        tracing::debug!(
            "Imported mesh '{}' ({} vertices, skinned: {}) with {} animations",
            mesh.name,
            mesh.vertex_count(),
            skin.is_some(),
            animations.len()
        );

        Ok(Self {
            mesh,
            mesh_node: mesh_node.index(),
            nodes,
            order,
            skin,
            animations,
            animation_index,
        })
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animation_index.get(name).map(|&i| &self.animations[i])
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.animations.iter().map(|a| a.name.as_str()).collect()
    }

    /// Node-local transforms at `time` of `animation`, rest pose when `None`
    pub fn local_matrices(&self, animation: Option<&Animation>, time: f32) -> Vec<Mat4> {
        let mut trs: Vec<(Vec3, Quat, Vec3)> = self
            .nodes
            .iter()
            .map(|n| (n.translation, n.rotation, n.scale))
            .collect();

        for channel in animation.iter().flat_map(|a| &a.channels) {
            let Some(node) = trs.get_mut(channel.node) else {
                continue;
            };
            let (times, values, mode) = (&channel.times, &channel.values, channel.interpolation);
            match channel.target {
                ChannelTarget::Translation => {
                    node.0 = interpolate::sample_vector(times, values, mode, time).truncate();
                }
                ChannelTarget::Rotation => {
                    node.1 = interpolate::sample_rotation(times, values, mode, time);
                }
                ChannelTarget::Scale => {
                    node.2 = interpolate::sample_vector(times, values, mode, time).truncate();
                }
            }
        }

        trs.into_iter()
            .map(|(t, r, s)| Mat4::from_scale_rotation_translation(s, r, t))
            .collect()
    }

    /// Scene-space transforms from node-local ones
    pub fn global_matrices(&self, locals: &[Mat4]) -> Vec<Mat4> {
        let mut globals = vec![Mat4::IDENTITY; locals.len()];
        for &i in &self.order {
            globals[i] = match self.nodes[i].parent {
                Some(parent) => globals[parent] * locals[i],
                None => locals[i],
            };
        }
        globals
    }
}

fn read_nodes(document: &gltf::Document) -> Vec<SceneNode> {
    let mut nodes: Vec<SceneNode> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            SceneNode {
                name: node.name().map(str::to_string),
                parent: None,
                translation: Vec3::from_array(t),
                rotation: Quat::from_array(r),
                scale: Vec3::from_array(s),
            }
        })
        .collect();

    for node in document.nodes() {
        for child in node.children() {
            nodes[child.index()].parent = Some(node.index());
        }
    }
    nodes
}

/// Parents-first node order
fn hierarchy_order(nodes: &[SceneNode]) -> Result<Vec<usize>> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut stack = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) => children[parent].push(i),
            None => stack.push(i),
        }
    }

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().copied());
    }

    if order.len() != nodes.len() {
        bail!("Node hierarchy contains a cycle");
    }
    Ok(order)
}

type Influences = (Vec<[u16; 4]>, Vec<[f32; 4]>);

/// Merge every triangle primitive of `mesh` into one indexed mesh
fn read_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
) -> Result<(Mesh, Option<Influences>)> {
    let name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));

    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Option<Vec<Vec3>> = Some(Vec::new());
    let mut uv_channels: [Option<Vec<Vec2>>; MAX_UV_CHANNELS] = Default::default();
    for channel in uv_channels.iter_mut() {
        *channel = Some(Vec::new());
    }
    let mut influences: Option<Influences> = Some((Vec::new(), Vec::new()));
    let mut indices: Vec<u32> = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            bail!(
                "Mesh '{}' primitive {} is {:?}; only triangle lists are supported",
                name,
                primitive.index(),
                primitive.mode()
            );
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let base = positions.len() as u32;
        let prim_positions: Vec<Vec3> = reader
            .read_positions()
            .with_context(|| format!("No positions in mesh '{}'", name))?
            .map(Vec3::from_array)
            .collect();
        let count = prim_positions.len();

        normals = match (normals, reader.read_normals()) {
            (Some(mut all), Some(iter)) => {
                all.extend(iter.map(Vec3::from_array));
                Some(all)
            }
            _ => None,
        };

        for (set, channel) in uv_channels.iter_mut().enumerate() {
            *channel = match (channel.take(), reader.read_tex_coords(set as u32)) {
                (Some(mut all), Some(iter)) => {
                    all.extend(iter.into_f32().map(Vec2::from_array));
                    Some(all)
                }
                _ => None,
            };
        }

        influences = match (influences, reader.read_joints(0), reader.read_weights(0)) {
            (Some((mut joints, mut weights)), Some(j), Some(w)) => {
                joints.extend(j.into_u16());
                weights.extend(w.into_f32());
                Some((joints, weights))
            }
            _ => None,
        };

        match reader.read_indices() {
            Some(iter) => indices.extend(iter.into_u32().map(|i| i + base)),
            None => indices.extend(base..base + count as u32),
        }

        positions.extend(prim_positions);
    }

    if positions.is_empty() {
        bail!("Mesh '{}' has no vertices", name);
    }

    let vertex_count = positions.len();
    let complete = |len: usize| len == vertex_count;
    let normals = normals.filter(|n| complete(n.len()));
    for channel in uv_channels.iter_mut() {
        if channel.as_ref().is_some_and(|c| !complete(c.len())) {
            *channel = None;
        }
    }
    let influences = influences.filter(|(j, w)| complete(j.len()) && complete(w.len()));

    let mesh = Mesh {
        name,
        positions,
        normals,
        uv_channels,
        indices,
    };
    Ok((mesh, influences))
}

fn read_skin(
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
    vertex_joints: Vec<[u16; 4]>,
    vertex_weights: Vec<[f32; 4]>,
) -> Result<SkinBinding> {
    let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
    if joints.is_empty() {
        bail!("Skin has no joints");
    }

    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_bind_matrices: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
        Some(iter) => iter.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
        None => vec![Mat4::IDENTITY; joints.len()],
    };
    if inverse_bind_matrices.len() != joints.len() {
        bail!(
            "Skin has {} joints but {} inverse bind matrices",
            joints.len(),
            inverse_bind_matrices.len()
        );
    }

    if let Some(bad) = vertex_joints
        .iter()
        .flatten()
        .find(|&&j| j as usize >= joints.len())
    {
        bail!(
            "Vertex references joint {} but the skin has {} joints",
            bad,
            joints.len()
        );
    }

    Ok(SkinBinding {
        joints,
        inverse_bind_matrices,
        vertex_joints,
        vertex_weights,
    })
}

pub(super) fn read_animation(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<Animation> {
    use gltf::animation::util::ReadOutputs;

    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation{}", animation.index()));

    let mut channels = Vec::new();
    let mut duration = 0.0f32;

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .with_context(|| format!("Animation '{}' channel has no inputs", name))?
            .collect();

        let (target, values): (ChannelTarget, Vec<Vec4>) = match reader.read_outputs() {
            Some(ReadOutputs::Translations(iter)) => (
                ChannelTarget::Translation,
                iter.map(|v| Vec3::from_array(v).extend(0.0)).collect(),
            ),
            Some(ReadOutputs::Rotations(iter)) => (
                ChannelTarget::Rotation,
                iter.into_f32().map(Vec4::from_array).collect(),
            ),
            Some(ReadOutputs::Scales(iter)) => (
                ChannelTarget::Scale,
                iter.map(|v| Vec3::from_array(v).extend(0.0)).collect(),
            ),
            // Morph target weights do not move skinned vertices
            Some(ReadOutputs::MorphTargetWeights(_)) => continue,
            None => bail!("Animation '{}' channel has no outputs", name),
        };

        let interpolation = Interpolation::from(channel.sampler().interpolation());
        let per_key = if interpolation == Interpolation::CubicSpline { 3 } else { 1 };
        if values.len() != times.len() * per_key {
            bail!(
                "Animation '{}' channel has {} keys but {} values",
                name,
                times.len(),
                values.len()
            );
        }

        if let Some(&t) = times.last() {
            duration = duration.max(t);
        }
        channels.push(Channel {
            node: channel.target().node().index(),
            target,
            interpolation,
            times,
            values,
        });
    }

    Ok(Animation {
        name,
        duration,
        channels,
    })
}

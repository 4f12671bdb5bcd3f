//! Animation evaluator backed by a glTF scene
//!
//! Skinned meshes use linear-blend skinning over the skin's joints; the mesh
//! node's own transform is ignored, as glTF specifies. Non-skinned meshes move
//! with their node's animated scene transform.

use anyhow::anyhow;
use glam::{Mat3, Mat4, Vec3};
use hashbrown::HashMap;
use vat_shared::ClipDescriptor;

use super::scene::{Animation, GltfScene};
use crate::error::EvalError;
use crate::evaluator::AnimationEvaluator;

/// Evaluates one animation of a [`GltfScene`] at a time
pub struct GltfEvaluator<'s> {
    scene: &'s GltfScene,
    /// Clip name -> animation name, for clips renamed in the manifest
    bindings: HashMap<String, String>,
    active: Option<&'s Animation>,
    time: f32,
}

impl<'s> GltfEvaluator<'s> {
    pub fn new(scene: &'s GltfScene) -> Self {
        Self {
            scene,
            bindings: HashMap::new(),
            active: None,
            time: 0.0,
        }
    }

    /// Play `animation` whenever the clip named `clip_name` is reset
    pub fn bind_clip(&mut self, clip_name: impl Into<String>, animation: impl Into<String>) {
        self.bindings.insert(clip_name.into(), animation.into());
    }

    /// Mesh-to-scene matrices for the current pose: one per vertex when
    /// skinned, a single matrix otherwise
    fn vertex_matrices(&self) -> Result<Vec<Mat4>, EvalError> {
        let animation = self
            .active
            .ok_or_else(|| anyhow!("no clip is being evaluated; reset first"))?;
        Ok(self.pose_matrices(Some(animation), self.time))
    }

    /// Mesh-to-scene matrices with `animation` applied at `time`, or the
    /// rest pose when `animation` is `None`
    fn pose_matrices(&self, animation: Option<&Animation>, time: f32) -> Vec<Mat4> {
        let locals = self.scene.local_matrices(animation, time);
        let globals = self.scene.global_matrices(&locals);

        let Some(skin) = &self.scene.skin else {
            return vec![globals[self.scene.mesh_node]];
        };

        let joint_matrices: Vec<Mat4> = skin
            .joints
            .iter()
            .zip(&skin.inverse_bind_matrices)
            .map(|(&node, ibm)| globals[node] * *ibm)
            .collect();

        skin.vertex_joints
            .iter()
            .zip(&skin.vertex_weights)
            .map(|(joints, weights)| {
                let total: f32 = weights.iter().sum();
                if total <= 0.0 {
                    return Mat4::IDENTITY;
                }
                joints
                    .iter()
                    .zip(weights)
                    .filter(|(_, w)| **w > 0.0)
                    .fold(Mat4::ZERO, |acc, (&j, &w)| {
                        acc + joint_matrices[j as usize] * (w / total)
                    })
            })
            .collect()
    }

    /// Source normals carried through `matrices`
    fn deform_normals(&self, matrices: &[Mat4]) -> Vec<Vec3> {
        let vertex_count = self.scene.mesh.vertex_count();
        let normals = match &self.scene.mesh.normals {
            Some(normals) => normals.clone(),
            None => vec![Vec3::Y; vertex_count],
        };

        let normal_matrix = |m: &Mat4| Mat3::from_mat4(*m).inverse().transpose();
        match matrices {
            [single] => {
                let nm = normal_matrix(single);
                normals.iter().map(|&n| (nm * n).normalize_or_zero()).collect()
            }
            per_vertex => normals
                .iter()
                .zip(per_vertex)
                .map(|(&n, m)| (normal_matrix(m) * n).normalize_or_zero())
                .collect(),
        }
    }
}

impl AnimationEvaluator for GltfEvaluator<'_> {
    fn reset(&mut self, clip: &ClipDescriptor) -> Result<(), EvalError> {
        let scene = self.scene;
        let name = self
            .bindings
            .get(&clip.name)
            .map(String::as_str)
            .unwrap_or(&clip.name);
        let animation = scene.animation(name).ok_or_else(|| {
            anyhow!(
                "animation '{}' not found. Available animations: {:?}",
                name,
                scene.animation_names()
            )
        })?;

        self.active = Some(animation);
        self.time = 0.0;
        Ok(())
    }

    fn advance(&mut self, delta_seconds: f32) -> Result<(), EvalError> {
        if self.active.is_none() {
            return Err(anyhow!("advance called outside an evaluation scope").into());
        }
        self.time += delta_seconds;
        Ok(())
    }

    fn sample_vertices(&mut self) -> Result<Vec<Vec3>, EvalError> {
        let matrices = self.vertex_matrices()?;
        let positions = &self.scene.mesh.positions;
        Ok(match matrices.as_slice() {
            [single] => positions.iter().map(|&p| single.transform_point3(p)).collect(),
            per_vertex => positions
                .iter()
                .zip(per_vertex)
                .map(|(&p, m)| m.transform_point3(p))
                .collect(),
        })
    }

    fn sample_normals(&mut self) -> Result<Vec<Vec3>, EvalError> {
        let matrices = self.vertex_matrices()?;
        Ok(self.deform_normals(&matrices))
    }

    fn rest_normals(&mut self) -> Result<Option<Vec<Vec3>>, EvalError> {
        let matrices = self.pose_matrices(None, 0.0);
        Ok(Some(self.deform_normals(&matrices)))
    }

    fn release(&mut self) {
        self.active = None;
        self.time = 0.0;
    }
}

//! glTF / GLB import
//!
//! Loads the bake mesh and its animations and drives them through
//! [`GltfEvaluator`].

mod evaluator;
pub mod interpolate;
mod scene;

pub use evaluator::GltfEvaluator;
pub use scene::{Animation, Channel, ChannelTarget, GltfScene, SceneNode, SkinBinding};

use anyhow::{Context, Result};
use std::path::Path;

/// Summary of one animation in a glTF file
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInfo {
    pub index: usize,
    pub name: String,
    pub channel_count: usize,
    pub duration: f32,
}

impl AnimationInfo {
    fn new(index: usize, animation: &Animation) -> Self {
        Self {
            index,
            name: animation.name.clone(),
            channel_count: animation.channels.len(),
            duration: animation.duration,
        }
    }
}

/// List the animations in a glTF file. Works on files without meshes.
pub fn list_animations(input: &Path) -> Result<Vec<AnimationInfo>> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    document
        .animations()
        .map(|a| Ok(AnimationInfo::new(a.index(), &scene::read_animation(&a, &buffers)?)))
        .collect()
}

/// Animations of an already imported scene
pub fn animation_infos(scene: &GltfScene) -> Vec<AnimationInfo> {
    scene
        .animations
        .iter()
        .enumerate()
        .map(|(index, a)| AnimationInfo::new(index, a))
        .collect()
}

//! Manifest parsing and bake orchestration
//!
//! Parses bake.toml and runs the bake it describes. Paths in the manifest are
//! relative to the manifest file.

use anyhow::{bail, Context, Result};
use glam::{Affine3A, Quat, Vec3};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vat_shared::{ClipDescriptor, ClipWrapMode, MAX_UV_CHANNELS};

use crate::bake::{BakeOutput, BakeSession};
use crate::formats::TextureFormat;
use crate::import::{GltfEvaluator, GltfScene};
use crate::output::{self, ArtifactPaths, OutputOptions};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "bake.toml";

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub source: SourceConfig,
    #[serde(default)]
    pub bake: BakeConfig,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
    #[serde(default)]
    pub output: OutputConfig,

    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// glTF or GLB file
    pub path: PathBuf,
    /// Mesh to bake; the first mesh in the scene when absent
    #[serde(default)]
    pub mesh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BakeConfig {
    #[serde(default = "default_uv_channel")]
    pub uv_channel: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    #[serde(default)]
    pub texture_format: TextureFormat,
    #[serde(default = "default_write_png")]
    pub write_png: bool,
    #[serde(default)]
    pub transform: Option<TransformConfig>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            uv_channel: default_uv_channel(),
            frame_rate: default_frame_rate(),
            texture_format: TextureFormat::default(),
            write_png: default_write_png(),
            transform: None,
        }
    }
}

fn default_uv_channel() -> u32 {
    1
}

fn default_frame_rate() -> f32 {
    30.0
}

fn default_write_png() -> bool {
    true
}

/// Translation / rotation (xyzw quaternion) / scale applied to baked data
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl TransformConfig {
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            Quat::from_array(self.rotation).normalize(),
            Vec3::from_array(self.translation),
        )
    }
}

/// A clip to bake: just the animation name, or a table with overrides
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClipEntry {
    Simple(String),
    Detailed {
        animation: String,
        /// Name in the clip layout; defaults to the animation name
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        frame_rate: Option<f32>,
        #[serde(default)]
        wrap: Option<ClipWrapMode>,
    },
}

impl ClipEntry {
    /// Animation in the source file
    pub fn animation(&self) -> &str {
        match self {
            ClipEntry::Simple(animation) => animation,
            ClipEntry::Detailed { animation, .. } => animation,
        }
    }

    /// Name the clip is addressed by after baking
    pub fn clip_name(&self) -> &str {
        match self {
            ClipEntry::Simple(animation) => animation,
            ClipEntry::Detailed {
                animation, name, ..
            } => name.as_deref().unwrap_or(animation),
        }
    }

    pub fn frame_rate(&self, default: f32) -> f32 {
        match self {
            ClipEntry::Simple(_) => default,
            ClipEntry::Detailed { frame_rate, .. } => frame_rate.unwrap_or(default),
        }
    }

    pub fn wrap(&self) -> ClipWrapMode {
        match self {
            ClipEntry::Simple(_) => ClipWrapMode::default(),
            ClipEntry::Detailed { wrap, .. } => wrap.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// File stem for every artifact; the source file stem when absent
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            name: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("baked")
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let mut manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    /// Parse manifest text; relative paths resolve against the working directory
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Check everything that can be checked without opening the source file
    pub fn validate(&self) -> Result<()> {
        if self.clips.is_empty() {
            bail!("Manifest lists no clips; add at least one [[clips]] entry");
        }
        if self.bake.uv_channel as usize >= MAX_UV_CHANNELS {
            bail!(
                "uv_channel {} out of range (must be 0-{})",
                self.bake.uv_channel,
                MAX_UV_CHANNELS - 1
            );
        }
        check_frame_rate("bake.frame_rate", self.bake.frame_rate)?;

        let mut names = HashSet::new();
        for clip in &self.clips {
            check_frame_rate(
                &format!("clip '{}' frame_rate", clip.clip_name()),
                clip.frame_rate(self.bake.frame_rate),
            )?;
            if !names.insert(clip.clip_name()) {
                bail!("Duplicate clip name '{}'", clip.clip_name());
            }
        }

        if let Some(transform) = &self.bake.transform {
            if transform.translation.iter().any(|t| !t.is_finite()) {
                bail!("Transform translation must be finite: {:?}", transform.translation);
            }
            if transform.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                bail!("Transform scale must be finite and non-zero: {:?}", transform.scale);
            }
            if transform.rotation.iter().any(|r| !r.is_finite())
                || Quat::from_array(transform.rotation).length() < 1e-6
            {
                bail!("Transform rotation is not a valid quaternion: {:?}", transform.rotation);
            }
        }

        if self.output.name.as_deref() == Some("") {
            bail!("Output name must not be empty");
        }
        Ok(())
    }

    pub fn source_path(&self) -> PathBuf {
        self.base_dir.join(&self.source.path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output.directory)
    }

    /// Artifact file stem
    pub fn output_name(&self) -> String {
        match &self.output.name {
            Some(name) => name.clone(),
            None => self
                .source
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "baked".to_string()),
        }
    }

    pub fn transform(&self) -> Option<Affine3A> {
        self.bake.transform.as_ref().map(TransformConfig::to_affine)
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            directory: self.output_dir(),
            name: self.output_name(),
            texture_format: self.bake.texture_format,
            write_png: self.bake.write_png,
        }
    }

    /// Clip descriptors for every entry, with lengths taken from `scene`
    pub fn resolve_clips(&self, scene: &GltfScene) -> Result<Vec<ClipDescriptor>> {
        self.clips
            .iter()
            .map(|entry| {
                let animation = scene.animation(entry.animation()).with_context(|| {
                    format!(
                        "Animation '{}' not found in {:?}. Available animations: {:?}",
                        entry.animation(),
                        self.source.path,
                        scene.animation_names()
                    )
                })?;
                Ok(ClipDescriptor::new(
                    entry.clip_name(),
                    animation.duration,
                    entry.frame_rate(self.bake.frame_rate),
                )
                .with_wrap_mode(entry.wrap()))
            })
            .collect()
    }

    /// Validate the manifest and load the source scene
    pub fn check(&self) -> Result<(GltfScene, Vec<ClipDescriptor>)> {
        self.validate()?;
        let scene = GltfScene::load(&self.source_path(), self.source.mesh.as_deref())?;
        let clips = self.resolve_clips(&scene)?;
        Ok((scene, clips))
    }

    /// Bake in memory without writing anything
    pub fn bake(&self) -> Result<BakeOutput> {
        let (scene, clips) = self.check()?;

        let mut evaluator = GltfEvaluator::new(&scene);
        for entry in &self.clips {
            evaluator.bind_clip(entry.clip_name(), entry.animation());
        }

        let mut session = BakeSession::new(scene.mesh.clone(), clips)
            .with_evaluator(evaluator)
            .with_uv_channel(self.bake.uv_channel);
        if let Some(transform) = self.transform() {
            session = session.with_transform(transform);
        }

        session
            .bake()
            .with_context(|| format!("Failed to bake {:?}", self.source.path))
    }

    /// Bake and persist every artifact
    pub fn build(&self) -> Result<ArtifactPaths> {
        let output = self.bake()?;
        output::write_bake_output(&output, &self.output_options())
    }
}

fn check_frame_rate(what: &str, frame_rate: f32) -> Result<()> {
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        bail!("{} must be positive, got {}", what, frame_rate);
    }
    Ok(())
}

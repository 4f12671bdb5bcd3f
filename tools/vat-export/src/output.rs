//! Artifact persistence
//!
//! Every artifact is encoded in memory first. Files are then written next to
//! their destinations under temporary names and renamed into place once all
//! of them are on disk, so a failed bake leaves no partial set behind.

use anyhow::{Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::bake::BakeOutput;
use crate::formats::{self, TextureFormat};

/// Texture artifact extension
pub const TEXTURE_EXT: &str = "vattex";
/// Lookup mesh artifact extension
pub const MESH_EXT: &str = "vatmesh";

/// Where and how to persist a bake
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub directory: PathBuf,
    /// File stem shared by every artifact
    pub name: String,
    pub texture_format: TextureFormat,
    pub write_png: bool,
}

/// Destination of each artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub texture: PathBuf,
    pub png: Option<PathBuf>,
    pub mesh: PathBuf,
    pub bounds: PathBuf,
    pub layout: PathBuf,
}

impl ArtifactPaths {
    pub fn new(directory: &Path, name: &str, write_png: bool) -> Self {
        let file = |suffix: &str, ext: &str| directory.join(format!("{name}-{suffix}.{ext}"));
        Self {
            texture: file("AnimationTexture", TEXTURE_EXT),
            png: write_png.then(|| file("AnimationTexture", "png")),
            mesh: file("VertexIDs", MESH_EXT),
            bounds: file("BoundingBox", "json"),
            layout: file("ClipLayout", "json"),
        }
    }

    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![self.texture.as_path()];
        paths.extend(self.png.as_deref());
        paths.extend([self.mesh.as_path(), self.bounds.as_path(), self.layout.as_path()]);
        paths
    }
}

/// Encode every artifact of `output`, paired with its destination
pub fn encode_artifacts(
    output: &BakeOutput,
    options: &OutputOptions,
) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let paths = ArtifactPaths::new(&options.directory, &options.name, options.write_png);

    if !options.texture_format.is_float() {
        let clamped = output.texture.out_of_range_count();
        if clamped > 0 {
            tracing::warn!(
                "{} texels outside [0, 1] will be clamped by {:?}",
                clamped,
                options.texture_format
            );
        }
    }

    let mut artifacts = vec![(
        paths.texture,
        formats::encode_vat_texture(&output.texture, options.texture_format)
            .context("Failed to encode animation texture")?,
    )];

    if let Some(png) = paths.png {
        let mut bytes = Vec::new();
        output
            .texture
            .to_rgba8()
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .context("Failed to encode PNG preview")?;
        artifacts.push((png, bytes));
    }

    artifacts.push((
        paths.mesh,
        formats::encode_vat_mesh(&output.mesh, output.lookup_channel)
            .context("Failed to encode lookup mesh")?,
    ));
    artifacts.push((
        paths.bounds,
        serde_json::to_vec_pretty(&output.bounds).context("Failed to encode bounding box")?,
    ));
    artifacts.push((
        paths.layout,
        output
            .layout
            .to_json()
            .context("Failed to encode clip layout")?
            .into_bytes(),
    ));

    Ok(artifacts)
}

/// Encode and write every artifact of `output`
pub fn write_bake_output(output: &BakeOutput, options: &OutputOptions) -> Result<ArtifactPaths> {
    let artifacts = encode_artifacts(output, options)?;
    commit(&options.directory, &artifacts)?;

    for (path, bytes) in &artifacts {
        tracing::info!("Wrote {:?} ({} bytes)", path, bytes.len());
    }
    Ok(ArtifactPaths::new(
        &options.directory,
        &options.name,
        options.write_png,
    ))
}

/// Write all files under temporary names, then rename them into place
fn commit(directory: &Path, artifacts: &[(PathBuf, Vec<u8>)]) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create output directory: {:?}", directory))?;

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(artifacts.len());
    for (path, bytes) in artifacts {
        let tmp = temp_path(path);
        if let Err(err) =
            fs::write(&tmp, bytes).with_context(|| format!("Failed to write {:?}", tmp))
        {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        staged.push((tmp, path.as_path()));
    }

    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(err) =
            fs::rename(tmp, path).with_context(|| format!("Failed to move {:?} into place", path))
        {
            discard(&staged[i..]);
            return Err(err);
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

//! vat-export - vertex animation texture baker
//!
//! Samples glTF animations into animation textures (.vattex) plus a lookup
//! mesh (.vatmesh), bounding box and clip layout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use vat_export::manifest::{MANIFEST_FILE, Manifest};
use vat_export::{formats, import, output};
use vat_shared::{BoundingBox, MultiClipLayout};

#[derive(Parser)]
#[command(name = "vat-export")]
#[command(about = "Vertex animation texture baker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake the clips listed in a manifest file
    Bake {
        /// Path to bake.toml manifest
        #[arg(default_value = MANIFEST_FILE)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a manifest and its source file without baking
    Check {
        /// Path to bake.toml manifest
        #[arg(default_value = MANIFEST_FILE)]
        manifest: PathBuf,
    },

    /// List the animations in a glTF/GLB file
    List {
        /// Input glTF/GLB file
        input: PathBuf,
    },

    /// Recompute the normalized times of a clip layout file
    Layout {
        /// Input ClipLayout.json
        input: PathBuf,

        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode one texture row back to object-space positions
    Decode {
        /// Input .vattex file
        input: PathBuf,

        /// BoundingBox.json written alongside the texture
        #[arg(short, long)]
        bounds: PathBuf,

        /// Texture row to decode
        #[arg(short, long, default_value_t = 0)]
        frame: u32,

        /// Write the positions as an OBJ point cloud (default: print)
        #[arg(long)]
        obj: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bake { manifest, output } => {
            tracing::info!("Baking from {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let mut options = config.output_options();
            if let Some(directory) = output {
                options.directory = directory;
            }
            let baked = config.bake()?;
            output::write_bake_output(&baked, &options)?;
            tracing::info!(
                "Bake complete: {}x{} texture, {} clips",
                baked.texture.width(),
                baked.texture.height(),
                baked.layout.len()
            );
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let (scene, clips) = config.check()?;
            let layout = MultiClipLayout::plan(&clips)?;
            tracing::info!(
                "Mesh '{}': {} vertices, texture would be {}x{}",
                scene.mesh.name,
                scene.mesh.vertex_count(),
                scene.mesh.vertex_count(),
                layout.total_frame_count
            );
            tracing::info!("Manifest is valid!");
        }

        Commands::List { input } => {
            let animations = import::list_animations(&input)?;
            if animations.is_empty() {
                tracing::info!("No animations found in {:?}", input);
            } else {
                tracing::info!("Animations in {:?}:", input);
                for info in animations {
                    tracing::info!(
                        "  [{}] '{}': {} channels, {:.3}s",
                        info.index,
                        info.name,
                        info.channel_count,
                        info.duration
                    );
                }
            }
        }

        Commands::Layout { input, output } => {
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read layout: {:?}", input))?;
            let layout = MultiClipLayout::from_json(&json)
                .with_context(|| format!("Failed to parse layout: {:?}", input))?
                .recompute()?;
            let json = layout.to_json()?;
            match output {
                Some(output) => {
                    std::fs::write(&output, json)
                        .with_context(|| format!("Failed to write layout: {:?}", output))?;
                    tracing::info!("Wrote {:?}", output);
                }
                None => println!("{}", json),
            }
        }

        Commands::Decode {
            input,
            bounds,
            frame,
            obj,
        } => {
            let bytes =
                std::fs::read(&input).with_context(|| format!("Failed to read {:?}", input))?;
            let (_, texture) = formats::read_vat_texture(&bytes)
                .with_context(|| format!("Failed to parse texture: {:?}", input))?;
            let bounds = load_bounds(&bounds)?;
            let positions = texture.decode_frame(frame, &bounds)?;

            let mut text = String::new();
            for p in &positions {
                writeln!(text, "v {} {} {}", p.x, p.y, p.z)?;
            }
            match obj {
                Some(obj) => {
                    std::fs::write(&obj, text)
                        .with_context(|| format!("Failed to write {:?}", obj))?;
                    tracing::info!("Wrote {} vertices to {:?}", positions.len(), obj);
                }
                None => print!("{}", text),
            }
        }
    }

    Ok(())
}

fn load_bounds(path: &Path) -> Result<BoundingBox> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let bounds: BoundingBox = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse bounding box: {:?}", path))?;
    bounds.validate()?;
    Ok(bounds)
}

//! Bake session
//!
//! Ties the passes together for one mesh and one clip list: bounds, then the
//! texture and lookup mesh. Collaborators are resolved once in the
//! constructor; a session without an evaluator bakes the bind pose, one
//! without a transform bakes in mesh space.

use glam::Vec3;
use vat_shared::{BoundingBox, ClipDescriptor, MultiClipLayout};

use crate::bounds;
use crate::error::{BakeError, BakeResult};
use crate::evaluator::{AnimationEvaluator, Identity, SpatialTransform, StaticPose};
use crate::mesh::{self, Mesh};
use crate::sampler::FrameSampler;
use crate::texture::{AnimationTexture, TextureAssembler};

/// Everything a bake produces, held in memory until persisted
#[derive(Debug, Clone)]
pub struct BakeOutput {
    pub texture: AnimationTexture,
    pub mesh: Mesh,
    pub layout: MultiClipLayout,
    pub bounds: BoundingBox,
    /// UV channel of `mesh` holding the column lookups
    pub lookup_channel: u32,
}

/// One bake of one mesh
pub struct BakeSession<'a> {
    mesh: Mesh,
    clips: Vec<ClipDescriptor>,
    evaluator: Box<dyn AnimationEvaluator + 'a>,
    transform: Box<dyn SpatialTransform + 'a>,
    uv_channel: u32,
    bounds: Option<BoundingBox>,
}

impl<'a> BakeSession<'a> {
    /// Session baking `clips` of `mesh` with the bind pose and no transform
    pub fn new(mesh: Mesh, clips: Vec<ClipDescriptor>) -> Self {
        let evaluator = Box::new(StaticPose::from_mesh(&mesh));
        Self {
            mesh,
            clips,
            evaluator,
            transform: Box::new(Identity),
            uv_channel: 0,
            bounds: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: impl AnimationEvaluator + 'a) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn with_transform(mut self, transform: impl SpatialTransform + 'a) -> Self {
        self.transform = Box::new(transform);
        self
    }

    /// UV channel that receives the column lookups (0-3, checked when baking)
    pub fn with_uv_channel(mut self, uv_channel: u32) -> Self {
        self.uv_channel = uv_channel;
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn clips(&self) -> &[ClipDescriptor] {
        &self.clips
    }

    pub fn bounds(&self) -> Option<&BoundingBox> {
        self.bounds.as_ref()
    }

    /// Use externally supplied bounds instead of computing them
    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = Some(bounds);
    }

    /// Run the bounds pass and remember the result
    pub fn compute_bounds(&mut self) -> BakeResult<BoundingBox> {
        let bounds = bounds::compute_bounds(
            &self.clips,
            self.evaluator.as_mut(),
            self.transform.as_ref(),
        )?;
        self.bounds = Some(bounds);
        Ok(bounds)
    }

    /// Bake the texture and lookup mesh against the session's bounds.
    ///
    /// Fails with [`BakeError::MissingBoundingBox`] before any sampling when no
    /// bounds were computed or set.
    pub fn bake_texture_and_mesh(&mut self) -> BakeResult<BakeOutput> {
        let bounds = self.bounds.ok_or(BakeError::MissingBoundingBox)?;
        bounds.validate()?;
        mesh::check_uv_channel(self.uv_channel)?;

        let vertex_count = self.mesh.vertex_count();
        if vertex_count == 0 {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}' has no vertices",
                self.mesh.name
            )));
        }

        let layout = MultiClipLayout::plan(&self.clips)?;
        let normals = self.bind_pose_normals()?;

        let transform = self.transform.as_ref();
        let mut assembler = TextureAssembler::new(&layout, vertex_count, &bounds)?;
        let mut sampler = FrameSampler::new(self.evaluator.as_mut());

        for (clip_index, entry) in layout.entries.iter().enumerate() {
            sampler.for_each_frame(&entry.clip, |frame, vertices| {
                let transformed: Vec<Vec3> = vertices
                    .iter()
                    .map(|&v| transform.transform_point(v))
                    .collect();
                assembler.write_frame(clip_index, frame, &transformed)
            })?;
        }

        let texture = assembler.finish()?;
        let lookup = mesh::annotate(&self.mesh, vertex_count, self.uv_channel, |i| {
            transform.transform_direction(normals[i])
        })?;

        tracing::info!(
            "Baked '{}': {} vertices x {} rows ({} clips, wrap {:?})",
            self.mesh.name,
            texture.width(),
            texture.height(),
            layout.len(),
            texture.wrap()
        );

        Ok(BakeOutput {
            texture,
            mesh: lookup,
            layout,
            bounds,
            lookup_channel: self.uv_channel,
        })
    }

    /// Compute bounds, then bake texture and mesh
    pub fn bake(&mut self) -> BakeResult<BakeOutput> {
        self.compute_bounds()?;
        self.bake_texture_and_mesh()
    }

    /// Untransformed bind-pose normals, one per vertex.
    ///
    /// Prefers the evaluator's rest-pose normals, which share the space of the
    /// sampled vertices. Otherwise taken from the source mesh; meshes without
    /// normals fall back to the evaluator's normals at the start of the first
    /// clip.
    fn bind_pose_normals(&mut self) -> BakeResult<Vec<Vec3>> {
        let vertex_count = self.mesh.vertex_count();
        let rest = self.evaluator.rest_normals().map_err(|e| {
            let clip = self.clips.first().map_or("", |c| c.name.as_str());
            BakeError::evaluation(clip, 0, e)
        })?;
        let normals = match (rest, &self.mesh.normals) {
            (Some(normals), _) => normals,
            (None, Some(normals)) => normals.clone(),
            (None, None) => {
                let first = self.clips.first().ok_or_else(|| {
                    BakeError::InvalidInput("at least one clip must be provided".to_string())
                })?;
                FrameSampler::new(self.evaluator.as_mut()).normals_at_start(first)?
            }
        };

        if normals.len() != vertex_count {
            return Err(BakeError::InvalidInput(format!(
                "mesh '{}' has {} normals for {} vertices",
                self.mesh.name,
                normals.len(),
                vertex_count
            )));
        }
        Ok(normals)
    }
}

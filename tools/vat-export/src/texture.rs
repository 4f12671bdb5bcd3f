//! Vertex animation texture assembly
//!
//! One row per frame, one column per vertex. Each texel holds the vertex
//! position relative to the bake's bounding box.

use glam::Vec3;
use image::{Rgba, RgbaImage};
use vat_shared::{BoundingBox, ClipLayoutEntry, MultiClipLayout, TextureWrap};

use crate::error::{BakeError, BakeResult};
use crate::formats::encode_unorm8;

/// Baked texture held in memory as linear floats
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTexture {
    width: u32,
    height: u32,
    wrap: TextureWrap,
    texels: Vec<Vec3>,
}

impl AnimationTexture {
    /// Wrap existing texel data (row-major, `width * height` entries)
    pub fn from_texels(
        width: u32,
        height: u32,
        wrap: TextureWrap,
        texels: Vec<Vec3>,
    ) -> BakeResult<Self> {
        if texels.len() != width as usize * height as usize {
            return Err(BakeError::InvalidInput(format!(
                "texture {}x{} needs {} texels, got {}",
                width,
                height,
                width as usize * height as usize,
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            wrap,
            texels,
        })
    }

    /// Number of vertices
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows, seams included
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn wrap(&self) -> TextureWrap {
        self.wrap
    }

    pub fn texels(&self) -> &[Vec3] {
        &self.texels
    }

    pub fn texel(&self, column: u32, row: u32) -> Vec3 {
        self.texels[row as usize * self.width as usize + column as usize]
    }

    pub fn row(&self, row: u32) -> &[Vec3] {
        let start = row as usize * self.width as usize;
        &self.texels[start..start + self.width as usize]
    }

    /// Decode one row back to absolute positions
    pub fn decode_frame(&self, row: u32, bounds: &BoundingBox) -> BakeResult<Vec<Vec3>> {
        if row >= self.height {
            return Err(BakeError::InvalidInput(format!(
                "frame {} out of range (texture has {} rows)",
                row, self.height
            )));
        }
        Ok(self
            .row(row)
            .iter()
            .map(|&t| bounds.to_absolute_position(t))
            .collect())
    }

    /// Count texels with a component outside `[0, 1]`
    pub fn out_of_range_count(&self) -> usize {
        self.texels
            .iter()
            .filter(|t| t.min_element() < 0.0 || t.max_element() > 1.0)
            .count()
    }

    /// 8-bit preview: RGB quantized from `[0, 1]`, alpha opaque
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let t = self.texel(x, y);
            Rgba([
                encode_unorm8(t.x),
                encode_unorm8(t.y),
                encode_unorm8(t.z),
                u8::MAX,
            ])
        })
    }
}

/// Fills a texture clip by clip, frame by frame.
///
/// Seam rows are written by [`TextureAssembler::finish`], after every clip's
/// frames are in place.
pub struct TextureAssembler<'a> {
    layout: &'a MultiClipLayout,
    bounds: BoundingBox,
    vertex_count: usize,
    texels: Vec<Vec3>,
    /// One flag per texture row, set once the row holds a sampled frame
    rows_written: Vec<bool>,
}

impl<'a> TextureAssembler<'a> {
    /// Fails for zero vertices or a degenerate bounding box
    pub fn new(
        layout: &'a MultiClipLayout,
        vertex_count: usize,
        bounds: &BoundingBox,
    ) -> BakeResult<Self> {
        if vertex_count == 0 {
            return Err(BakeError::InvalidInput(
                "cannot bake a texture for zero vertices".to_string(),
            ));
        }
        if layout.is_empty() {
            return Err(BakeError::InvalidInput("layout has no clips".to_string()));
        }
        bounds.validate()?;
        if let Some(entry) = layout
            .entries
            .iter()
            .find(|e| e.rows().end > layout.total_frame_count)
        {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}' ends past the layout's {} rows",
                entry.clip_name(),
                layout.total_frame_count
            )));
        }

        let texel_count = vertex_count * layout.total_frame_count as usize;
        Ok(Self {
            layout,
            bounds: *bounds,
            vertex_count,
            texels: vec![Vec3::ZERO; texel_count],
            rows_written: vec![false; layout.total_frame_count as usize],
        })
    }

    /// Store frame `frame` of clip `clip_index`. `positions` are already in
    /// bounding-box space and get normalized here.
    pub fn write_frame(
        &mut self,
        clip_index: usize,
        frame: u32,
        positions: &[Vec3],
    ) -> BakeResult<()> {
        let entry = self.layout.entry(clip_index)?;
        if frame >= entry.frame_count {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}' has {} frames, got frame {}",
                entry.clip_name(),
                entry.frame_count,
                frame
            )));
        }
        if positions.len() != self.vertex_count {
            return Err(BakeError::InvalidInput(format!(
                "clip '{}' frame {}: expected {} vertices, got {}",
                entry.clip_name(),
                frame,
                self.vertex_count,
                positions.len()
            )));
        }

        let row = (entry.start_frame + frame) as usize;
        let start = row * self.vertex_count;
        let bounds = self.bounds;
        for (texel, &p) in self.texels[start..start + self.vertex_count]
            .iter_mut()
            .zip(positions)
        {
            *texel = bounds.to_relative_position(p);
        }
        self.rows_written[row] = true;
        Ok(())
    }

    /// Duplicate seam rows and pick the wrap mode
    pub fn finish(mut self) -> BakeResult<AnimationTexture> {
        for entry in &self.layout.entries {
            let written = entry
                .rows()
                .filter(|&row| self.rows_written[row as usize])
                .count();
            if written != entry.frame_count as usize {
                return Err(BakeError::InvalidInput(format!(
                    "clip '{}' wrote {} of {} frames",
                    entry.clip_name(),
                    written,
                    entry.frame_count
                )));
            }
        }

        let width = self.vertex_count;
        for seam in self.layout.seam_rows() {
            let seam = seam as usize;
            let src = (seam - 1) * width;
            self.texels.copy_within(src..src + width, seam * width);
        }

        let texture = AnimationTexture {
            width: width as u32,
            height: self.layout.total_frame_count,
            wrap: self.layout.texture_wrap(),
            texels: self.texels,
        };

        let outside = texture.out_of_range_count();
        if outside > 0 {
            tracing::warn!(
                "{} texels fall outside the bounding box; stored unclamped",
                outside
            );
        }

        Ok(texture)
    }
}

/// Assemble a texture by pulling every frame from `frame_fn`.
///
/// `frame_fn(entry, frame)` returns the bounding-box-space positions of
/// `frame` within `entry`'s clip.
pub fn assemble<F>(
    layout: &MultiClipLayout,
    vertex_count: usize,
    bounds: &BoundingBox,
    mut frame_fn: F,
) -> BakeResult<AnimationTexture>
where
    F: FnMut(&ClipLayoutEntry, u32) -> BakeResult<Vec<Vec3>>,
{
    let mut assembler = TextureAssembler::new(layout, vertex_count, bounds)?;
    for (clip_index, entry) in layout.entries.iter().enumerate() {
        for frame in 0..entry.frame_count {
            let positions = frame_fn(entry, frame)?;
            assembler.write_frame(clip_index, frame, &positions)?;
        }
    }
    assembler.finish()
}

//! Texture atlas packing
//!
//! One square atlas per material slot. The atlas is split into
//! `atlas_width × atlas_width` tiles, row-major, and primitive `i` of the
//! consolidated mesh owns tile `i`.

mod compose;
mod uv;

pub use compose::{copy_textures_to_atlases, CompositeStats};
pub use uv::{remap_mesh_uvs, remap_uvs_to_atlas};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::config::Lod;
use crate::document::{Document, Id, Material, TextureChannel, Texture};
use crate::texture;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    #[error("cannot lay out an atlas for zero primitives")]
    NoPrimitives,

    #[error("atlas resolution {0} is not a non-zero power of two")]
    InvalidResolution(u32),

    #[error("{primitives} primitives need {atlas_width} tiles per row, more than the {resolution} px atlas holds")]
    TooManyTiles {
        primitives: u32,
        atlas_width: u32,
        resolution: u32,
    },

    #[error("unsupported image type {0:?}")]
    UnsupportedMime(String),
}

/// Material input packed into its own atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasSlot {
    Base,
    MetallicRoughness,
    Normals,
    Occlusion,
}

impl AtlasSlot {
    pub const ALL: [AtlasSlot; 4] = [
        AtlasSlot::Base,
        AtlasSlot::MetallicRoughness,
        AtlasSlot::Normals,
        AtlasSlot::Occlusion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AtlasSlot::Base => "base",
            AtlasSlot::MetallicRoughness => "metallic-roughness",
            AtlasSlot::Normals => "normals",
            AtlasSlot::Occlusion => "occlusion",
        }
    }

    /// Pixel value of tiles no texture was copied into
    pub fn fill(self) -> [u8; 4] {
        match self {
            AtlasSlot::Base => [0, 0, 0, 255],
            // metalness 0, roughness 1
            AtlasSlot::MetallicRoughness => [0, 255, 0, 255],
            // +Z tangent-space normal
            AtlasSlot::Normals => [128, 128, 255, 255],
            AtlasSlot::Occlusion => [255, 255, 255, 255],
        }
    }

    pub fn channel(self) -> TextureChannel {
        match self {
            AtlasSlot::Base => TextureChannel::BaseColor,
            AtlasSlot::MetallicRoughness => TextureChannel::MetallicRoughness,
            AtlasSlot::Normals => TextureChannel::Normal,
            AtlasSlot::Occlusion => TextureChannel::Occlusion,
        }
    }

    /// Slots packed at a detail level: normals up to LOD 2, occlusion up to LOD 1
    pub fn for_lod(lod: Lod) -> Vec<AtlasSlot> {
        let mut slots = vec![AtlasSlot::Base, AtlasSlot::MetallicRoughness];
        if lod.level() <= 2 {
            slots.push(AtlasSlot::Normals);
        }
        if lod.level() <= 1 {
            slots.push(AtlasSlot::Occlusion);
        }
        slots
    }
}

/// Tile grid for a primitive count and atlas resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    primitive_count: u32,
    atlas_width: u32,
    resolution: u32,
}

impl AtlasLayout {
    pub fn new(primitive_count: u32, resolution: u32) -> Result<Self, AtlasError> {
        if primitive_count == 0 {
            return Err(AtlasError::NoPrimitives);
        }
        if !resolution.is_power_of_two() {
            return Err(AtlasError::InvalidResolution(resolution));
        }
        let atlas_width = ceil_sqrt(primitive_count);
        if atlas_width > resolution {
            return Err(AtlasError::TooManyTiles {
                primitives: primitive_count,
                atlas_width,
                resolution,
            });
        }
        Ok(Self {
            primitive_count,
            atlas_width,
            resolution,
        })
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitive_count
    }

    /// Tiles per row (and per column)
    pub fn atlas_width(&self) -> u32 {
        self.atlas_width
    }

    pub fn tiles_count(&self) -> u32 {
        self.atlas_width * self.atlas_width
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Tile edge in pixels; border pixels left over by the floor stay at the fill color
    pub fn tile_size(&self) -> u32 {
        self.resolution / self.atlas_width
    }

    /// Grid cell of tile `index`
    pub fn tile(&self, index: u32) -> (u32, u32) {
        (index % self.atlas_width, index / self.atlas_width)
    }

    /// Pixel origin of tile `index`
    pub fn tile_origin(&self, index: u32) -> (u32, u32) {
        let (x, y) = self.tile(index);
        let tile_res = self.resolution as f64 / self.atlas_width as f64;
        (
            (x as f64 * tile_res).round() as u32,
            (y as f64 * tile_res).round() as u32,
        )
    }
}

/// Smallest `w` with `w * w >= n`
fn ceil_sqrt(n: u32) -> u32 {
    let root = n.isqrt();
    if root * root == n { root } else { root + 1 }
}

/// Atlas raster for one slot, bound to a Texture entity of the document
pub struct Atlas {
    slot: AtlasSlot,
    texture: Id<Texture>,
    raster: RgbaImage,
    mime_type: &'static str,
}

impl Atlas {
    pub fn slot(&self) -> AtlasSlot {
        self.slot
    }

    pub fn texture(&self) -> Id<Texture> {
        self.texture
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Copy the RGB channels of `source` with its top-left at `(x, y)`.
    /// Destination alpha keeps its fill value; out-of-bounds pixels are dropped.
    pub fn blit_rgb(&mut self, source: &RgbaImage, x: u32, y: u32) {
        let (width, height) = self.raster.dimensions();
        for (sx, sy, pixel) in source.enumerate_pixels() {
            let (dx, dy) = (x + sx, y + sy);
            if dx >= width || dy >= height {
                continue;
            }
            let target = self.raster.get_pixel_mut(dx, dy);
            target.0[..3].copy_from_slice(&pixel.0[..3]);
        }
    }

    /// Encode the raster and store it on the bound Texture entity
    pub fn upload(&self, doc: &mut Document) -> Result<()> {
        let bytes = texture::encode(&self.raster, self.mime_type)
            .with_context(|| format!("Failed to encode atlas-{}", self.slot.name()))?;
        let texture = doc
            .textures
            .get_mut(self.texture)
            .with_context(|| format!("atlas-{} texture was disposed", self.slot.name()))?;
        texture.image = bytes;
        texture.mime_type = self.mime_type.to_string();
        Ok(())
    }
}

/// Allocate one filled atlas per slot and bind each into `material`
pub fn create_atlases(
    doc: &mut Document,
    layout: &AtlasLayout,
    material: Id<Material>,
    slots: &[AtlasSlot],
    mime_type: &'static str,
) -> Vec<Atlas> {
    slots
        .iter()
        .map(|&slot| {
            let raster = RgbaImage::from_pixel(layout.resolution(), layout.resolution(), Rgba(slot.fill()));
            let texture = doc.create_texture(format!("atlas-{}", slot.name()), Vec::new(), mime_type);
            let accessors = slot.channel().accessors();
            (accessors.set)(&mut doc.materials[material], Some(texture));
            Atlas {
                slot,
                texture,
                raster,
                mime_type,
            }
        })
        .collect()
}

//! Texture compositing into atlas tiles

use anyhow::{Context, Result};
use std::collections::VecDeque;

use super::{Atlas, AtlasLayout};
use crate::document::{Document, Id, Mesh, Texture};
use crate::texture;

/// One texture copy into one atlas
struct CopyJob {
    tile: u32,
    atlas: usize,
    texture: Id<Texture>,
    origin: (u32, u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub copies: usize,
    /// Primitive/slot pairs left at the fill color
    pub empty_tiles: usize,
}

/// Copy every primitive's original per-slot texture into its tile.
///
/// Primitives of `mesh` are visited last to first; a primitive's tile is its
/// list position. Copies run one at a time off a FIFO queue so only one
/// decoded source image is alive at once.
pub fn copy_textures_to_atlases(
    doc: &Document,
    mesh: Id<Mesh>,
    atlases: &mut [Atlas],
    layout: &AtlasLayout,
) -> Result<CompositeStats> {
    let primitives = &doc.meshes[mesh].primitives;
    let mut stats = CompositeStats::default();
    let mut queue = VecDeque::new();

    for (index, &id) in primitives.iter().enumerate().rev() {
        let tile = index as u32;
        let Some(material) = doc.primitives[id]
            .original_material
            .and_then(|m| doc.materials.get(m))
        else {
            stats.empty_tiles += atlases.len();
            continue;
        };

        let origin = layout.tile_origin(tile);
        for (atlas, slot_atlas) in atlases.iter().enumerate() {
            match (slot_atlas.slot().channel().accessors().get)(material) {
                Some(texture) => queue.push_back(CopyJob {
                    tile,
                    atlas,
                    texture,
                    origin,
                }),
                None => stats.empty_tiles += 1,
            }
        }
    }

    while let Some(job) = queue.pop_front() {
        let source = doc
            .textures
            .get(job.texture)
            .with_context(|| format!("Texture {:?} for tile {} was disposed", job.texture, job.tile))?;
        let pixels = texture::decode(&source.image, &source.mime_type)
            .with_context(|| format!("Failed to decode texture {:?} for tile {}", source.name, job.tile))?;
        let (x, y) = job.origin;
        atlases[job.atlas].blit_rgb(&pixels, x, y);
        stats.copies += 1;
    }

    tracing::debug!(
        "Composited {} textures, {} tiles left at fill",
        stats.copies,
        stats.empty_tiles
    );
    Ok(stats)
}

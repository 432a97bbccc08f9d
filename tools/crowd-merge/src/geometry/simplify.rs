//! Mesh simplification through meshoptimizer

use anyhow::{anyhow, Result};
use meshopt::{SimplifyOptions, VertexDataAdapter};

use super::compact_vertices;
use crate::document::{Document, Mode, Primitive};

/// Simplify every indexed triangle primitive.
///
/// `ratio` is the target fraction of indices to keep (0 simplifies as far as
/// `error` allows); `error` is relative to the mesh extents. Returns the
/// number of vertices removed.
pub fn simplify(doc: &mut Document, ratio: f32, error: f32) -> Result<usize> {
    let mut removed = 0;
    for (id, primitive) in doc.primitives.iter_mut() {
        let before = primitive.vertex_count();
        simplify_primitive(primitive, ratio, error)
            .map_err(|err| err.context(format!("Failed to simplify primitive {:?}", id)))?;
        removed += before.saturating_sub(primitive.vertex_count());
    }
    tracing::debug!("Simplify removed {} vertices", removed);
    Ok(removed)
}

/// Returns false when the primitive was skipped (not an indexed triangle list)
pub fn simplify_primitive(primitive: &mut Primitive, ratio: f32, error: f32) -> Result<bool> {
    if primitive.mode != Mode::Triangles {
        return Ok(false);
    }
    let (Some(indices), Some(positions)) = (primitive.indices.as_ref(), primitive.positions())
    else {
        return Ok(false);
    };
    if indices.len() < 3 {
        return Ok(false);
    }

    let target = ((indices.len() as f32 * ratio.clamp(0.0, 1.0)) as usize / 3) * 3;
    let simplified = {
        let vertices = VertexDataAdapter::new(bytemuck::cast_slice(positions), 12, 0)
            .map_err(|err| anyhow!("Invalid vertex data: {:?}", err))?;
        meshopt::simplify(
            indices,
            &vertices,
            target,
            error,
            SimplifyOptions::empty(),
            None,
        )
    };

    primitive.indices = Some(simplified);
    compact_vertices(primitive);
    Ok(true)
}

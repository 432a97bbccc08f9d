//! Primitive joining, culling and attribute cleanup

use anyhow::{Context, Result};

use crate::config::Lod;
use crate::document::{Document, Id, Material, Primitive, Semantic};
use crate::geometry;

/// Join every primitive of the first mesh into one.
///
/// Tile indices are positions in the first mesh's primitive list, so this
/// must run after UV remapping and atlas compositing.
pub fn merge_primitives(doc: &mut Document) -> Result<Id<Primitive>> {
    let mesh = *doc
        .meshes
        .ids()
        .first()
        .context("Document has no mesh to merge primitives into")?;
    let ids = doc.meshes[mesh].primitives.clone();

    let joined = {
        let primitives: Vec<&Primitive> = ids.iter().map(|&id| &doc.primitives[id]).collect();
        geometry::join(&primitives).context("Failed to join primitives")?
    };

    for &id in ids.iter().rev() {
        doc.dispose_primitive(id);
    }
    let joined = doc.create_primitive(joined);
    doc.meshes[mesh].primitives.push(joined);

    tracing::info!("Merged {} primitives into one", ids.len());
    Ok(joined)
}

/// Dispose every primitive whose material matches `predicate`.
/// Primitives without a material are kept. Returns the removed count.
pub fn remove_primitives_by_material<F>(doc: &mut Document, predicate: F) -> usize
where
    F: Fn(&Material) -> bool,
{
    let mut removed = 0;
    for mesh in doc.meshes.ids().into_iter().rev() {
        let primitives = doc.meshes[mesh].primitives.clone();
        for id in primitives.into_iter().rev() {
            let matches = doc.primitives[id]
                .material
                .and_then(|m| doc.materials.get(m))
                .is_some_and(&predicate);
            if matches {
                doc.dispose_primitive(id);
                removed += 1;
            }
        }
    }

    if removed > 0 {
        tracing::info!("Removed primitives: {}", removed);
    }
    removed
}

/// Material names of parts dropped at reduced detail levels
pub fn is_culled_at_lod(material_name: &str, lod: Lod) -> bool {
    if lod.level() == 0 {
        return false;
    }
    material_name.contains("Teeth")
        || (material_name.contains("FullBody") && material_name.contains("Hair"))
        || (lod.level() >= 2 && material_name.contains("Eyes"))
}

/// Drop the second joint/weight set, keeping four influences per vertex
pub fn strip_secondary_skinning(doc: &mut Document) {
    for (_, primitive) in doc.primitives.iter_mut() {
        primitive.attributes.remove(&Semantic::Joints(1));
        primitive.attributes.remove(&Semantic::Weights(1));
    }
}

//! Geometry passes over a [`Document`]

mod codec;
mod flatten;
mod prune;
mod simplify;
mod weld;

pub use codec::{
    compress_geometry, CompressionMethod, CompressionSettings, GeometryCodec, MAX_COMPRESSION_LEVEL,
};
pub use flatten::flatten;
pub use prune::{prune, PruneReport};
pub use simplify::{simplify, simplify_primitive};
pub use weld::{weld, weld_primitive};

use anyhow::{bail, Result};
use hashbrown::HashSet;

use crate::document::{Attribute, Document, Id, Primitive, Scene, Semantic};

/// Concatenate primitives into one.
///
/// Attributes present on every input (with matching element types) are
/// concatenated; the rest are dropped. Indices are offset per input, and
/// non-indexed inputs get sequential indices. The result keeps the first
/// input's mode and materials.
pub fn join(primitives: &[&Primitive]) -> Result<Primitive> {
    let Some(first) = primitives.first() else {
        bail!("Cannot join an empty primitive list");
    };

    let semantics: Vec<Semantic> = first
        .attributes
        .iter()
        .filter(|(semantic, attribute)| {
            primitives.iter().all(|p| {
                p.attribute(**semantic)
                    .is_some_and(|other| other.same_kind(attribute))
            })
        })
        .map(|(&semantic, _)| semantic)
        .collect();

    let dropped = first.attributes.len() - semantics.len();
    if dropped > 0 {
        tracing::debug!("Join dropped {} attributes missing from some inputs", dropped);
    }

    let mut joined = Primitive::new();
    joined.mode = first.mode;
    joined.material = first.material;
    joined.original_material = first.original_material;

    let mut indices = Vec::new();
    let mut base = 0u32;
    for primitive in primitives {
        indices.extend(primitive.indices_or_sequential().into_iter().map(|i| i + base));
        base += primitive.vertex_count() as u32;

        for &semantic in &semantics {
            let Some(attribute) = primitive.attribute(semantic) else {
                continue;
            };
            match joined.attributes.get_mut(&semantic) {
                Some(target) => {
                    target.extend_from(attribute);
                }
                None => {
                    joined.attributes.insert(semantic, attribute.clone());
                }
            }
        }
    }
    joined.indices = Some(indices);
    Ok(joined)
}

/// Vertices the GPU receives for `scene`: every distinct mesh reachable from
/// its nodes contributes each of its primitives' vertices once.
pub fn vertex_count(doc: &Document, scene: Id<Scene>) -> usize {
    let meshes: HashSet<_> = doc
        .scene_nodes(scene)
        .into_iter()
        .filter_map(|node| doc.nodes[node].mesh)
        .collect();
    meshes
        .into_iter()
        .filter_map(|mesh| doc.meshes.get(mesh))
        .flat_map(|mesh| mesh.primitives.iter())
        .filter_map(|&p| doc.primitives.get(p))
        .map(Primitive::vertex_count)
        .sum()
}

/// Drop vertices no index references, renumbering indices
pub(crate) fn compact_vertices(primitive: &mut Primitive) {
    let Some(indices) = primitive.indices.as_mut() else {
        return;
    };
    let vertex_count = primitive.attributes.values().map(Attribute::len).min().unwrap_or(0);
    if indices.iter().any(|&i| i as usize >= vertex_count) {
        return;
    }

    let mut remap = vec![u32::MAX; vertex_count];
    let mut order = Vec::new();
    for index in indices.iter_mut() {
        let slot = &mut remap[*index as usize];
        if *slot == u32::MAX {
            *slot = order.len() as u32;
            order.push(*index);
        }
        *index = *slot;
    }

    if order.len() == vertex_count {
        return;
    }
    for attribute in primitive.attributes.values_mut() {
        *attribute = attribute.gather(&order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Material, Node, Parent};

    fn quad(x: f32) -> Primitive {
        Primitive::new()
            .with_attribute(
                Semantic::Position,
                Attribute::Vec3(vec![[x, 0.0, 0.0], [x, 1.0, 0.0], [x, 1.0, 1.0], [x, 0.0, 1.0]]),
            )
            .with_attribute(Semantic::TexCoord(0), Attribute::Vec2(vec![[0.0; 2]; 4]))
            .with_indices(vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_join_offsets_indices() {
        let a = quad(0.0);
        let b = quad(1.0);
        let joined = join(&[&a, &b]).unwrap();

        assert_eq!(joined.vertex_count(), 8);
        assert_eq!(
            joined.indices.as_deref(),
            Some(&[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7][..])
        );
    }

    #[test]
    fn test_join_drops_partial_attributes() {
        let a = quad(0.0).with_attribute(Semantic::Normal, Attribute::Vec3(vec![[0.0, 0.0, 1.0]; 4]));
        let mut b = quad(1.0);
        b.indices = None;
        let joined = join(&[&a, &b]).unwrap();

        assert!(joined.attribute(Semantic::Normal).is_none());
        assert!(joined.attribute(Semantic::TexCoord(0)).is_some());
        let indices = joined.indices.unwrap_or_default();
        assert_eq!(&indices[6..], &[4, 5, 6, 7]);
    }

    #[test]
    fn test_join_keeps_first_material() {
        let mut doc = Document::new();
        let m0 = doc.create_material(Material::new("m0"));
        let m1 = doc.create_material(Material::new("m1"));
        let a = quad(0.0).with_material(m0);
        let b = quad(1.0).with_material(m1);
        assert_eq!(join(&[&a, &b]).unwrap().material, Some(m0));
    }

    #[test]
    fn test_join_empty_is_error() {
        assert!(join(&[]).is_err());
    }

    #[test]
    fn test_vertex_count_counts_shared_mesh_once() {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");
        let primitive = doc.create_primitive(quad(0.0));
        let mesh = doc.create_mesh("quad");
        doc.meshes[mesh].primitives.push(primitive);
        for name in ["a", "b"] {
            let mut node = Node::new(name);
            node.mesh = Some(mesh);
            let node = doc.create_node(node);
            doc.add_child(Parent::Scene(scene), node);
        }
        assert_eq!(vertex_count(&doc, scene), 4);
    }

    #[test]
    fn test_compact_drops_unreferenced_vertices() {
        let mut primitive = quad(0.0);
        primitive.indices = Some(vec![3, 1, 2]);
        compact_vertices(&mut primitive);
        assert_eq!(primitive.indices.as_deref(), Some(&[0, 1, 2][..]));
        assert_eq!(
            primitive.positions().map(<[_]>::to_vec),
            Some(vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0]])
        );
    }
}

//! Moves every primitive under the first mesh

use anyhow::{bail, Result};

use crate::document::{Document, Id, Material, Primitive};

/// Collapse all meshes into the first one and bind `shared_material` to
/// every primitive, remembering each primitive's previous material.
///
/// Meshes are walked from last to first and primitives from last to first;
/// moved primitives are appended to the first mesh in that order. The
/// first mesh's primitive list afterwards (its own primitives, then the
/// moved ones) is the tile order used by the atlas passes. Returns the
/// moved primitives in traversal order.
pub fn reparent_primitives(
    doc: &mut Document,
    shared_material: Id<Material>,
) -> Result<Vec<Id<Primitive>>> {
    let meshes = doc.meshes.ids();
    let Some(&target) = meshes.first() else {
        bail!("Document has no meshes to consolidate");
    };

    let mut moved = Vec::new();
    for (position, &mesh) in meshes.iter().enumerate().rev() {
        let primitives = doc.meshes[mesh].primitives.clone();
        for &id in primitives.iter().rev() {
            let primitive = &mut doc.primitives[id];
            if primitive.original_material.is_none() {
                primitive.original_material = primitive.material;
            }
            primitive.material = Some(shared_material);

            if position > 0 {
                doc.meshes[mesh].primitives.retain(|&p| p != id);
                doc.meshes[target].primitives.push(id);
                moved.push(id);
            }
        }

        if position > 0 && doc.meshes[mesh].primitives.is_empty() {
            for node in doc.nodes_with_mesh(mesh) {
                doc.dispose_node(node);
            }
            doc.dispose_mesh(mesh);
        }
    }

    tracing::debug!(
        "Reparented {} primitives into mesh {:?}",
        moved.len(),
        doc.meshes[target].name
    );
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Node, Parent};

    /// `counts[m]` primitives on mesh `m`, each mesh on its own scene root
    fn document(counts: &[usize]) -> (Document, Vec<Id<Primitive>>) {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");
        let mut primitives = Vec::new();
        for (m, &count) in counts.iter().enumerate() {
            let material = doc.create_material(Material::new(format!("m{m}")));
            let mesh = doc.create_mesh(format!("mesh{m}"));
            for _ in 0..count {
                let primitive = doc.create_primitive(Primitive::new().with_material(material));
                doc.meshes[mesh].primitives.push(primitive);
                primitives.push(primitive);
            }
            let mut node = Node::new(format!("node{m}"));
            node.mesh = Some(mesh);
            let node = doc.create_node(node);
            doc.add_child(Parent::Scene(scene), node);
        }
        (doc, primitives)
    }

    #[test]
    fn test_one_mesh_holds_every_primitive() {
        let (mut doc, all) = document(&[2, 1, 3]);
        let shared = doc.create_material(Material::new("main"));

        let moved = reparent_primitives(&mut doc, shared).unwrap();

        assert_eq!(moved.len(), 4);
        assert_eq!(doc.meshes.len(), 1);
        let (_, mesh) = doc.meshes.iter().next().unwrap();
        assert_eq!(mesh.primitives.len(), all.len());
        for (_, primitive) in doc.primitives.iter() {
            assert_eq!(primitive.material, Some(shared));
            assert!(primitive.original_material.is_some());
        }
        // Nodes of the disposed meshes are gone
        assert_eq!(doc.nodes.len(), 1);
        let scene = doc.scenes.ids()[0];
        assert_eq!(doc.scenes[scene].children.len(), 1);
    }

    #[test]
    fn test_traversal_order_is_reverse_reverse() {
        let (mut doc, all) = document(&[1, 2, 2]);
        let shared = doc.create_material(Material::new("main"));

        let moved = reparent_primitives(&mut doc, shared).unwrap();

        // mesh2 (all[3], all[4]) reversed, then mesh1 (all[1], all[2]) reversed
        assert_eq!(moved, vec![all[4], all[3], all[2], all[1]]);
        let target = doc.meshes.ids()[0];
        assert_eq!(
            doc.meshes[target].primitives,
            vec![all[0], all[4], all[3], all[2], all[1]]
        );
    }

    #[test]
    fn test_original_material_recorded_once() {
        let (mut doc, all) = document(&[1, 1]);
        let first = doc.create_material(Material::new("first"));
        let second = doc.create_material(Material::new("second"));
        let before = doc.primitives[all[1]].material;

        reparent_primitives(&mut doc, first).unwrap();
        reparent_primitives(&mut doc, second).unwrap();

        assert_eq!(doc.primitives[all[1]].original_material, before);
        assert_eq!(doc.primitives[all[1]].material, Some(second));
    }

    #[test]
    fn test_no_meshes_is_an_error() {
        let mut doc = Document::new();
        let shared = doc.create_material(Material::new("main"));
        assert!(reparent_primitives(&mut doc, shared).is_err());
    }
}

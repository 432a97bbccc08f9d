//! Hierarchy flattening

use super::prune::prune_nodes;
use crate::document::{Document, Id, Node, Parent};

/// Move every node outside a skeleton to the root of its scene, baking its
/// world transform into its local one. Joints and their descendants keep
/// their hierarchy. Returns the number of nodes moved.
pub fn flatten(doc: &mut Document) -> usize {
    let mut moves = Vec::new();
    for scene in doc.scenes.ids() {
        for node in doc.scene_nodes(scene) {
            if !matches!(doc.parent_of(node), Some(Parent::Node(_))) {
                continue;
            }
            if in_skeleton(doc, node) {
                continue;
            }
            moves.push((scene, node, doc.world_matrix(node)));
        }
    }

    for &(scene, node, world) in &moves {
        doc.detach_node(node);
        doc.nodes[node].set_matrix(world);
        doc.add_child(Parent::Scene(scene), node);
    }

    let pruned = prune_nodes(doc);
    tracing::debug!("Flattened {} nodes, pruned {} empty", moves.len(), pruned);
    moves.len()
}

/// Node is a joint or sits below one
fn in_skeleton(doc: &Document, node: Id<Node>) -> bool {
    let mut current = node;
    loop {
        if doc.is_joint(current) {
            return true;
        }
        match doc.parent_of(current) {
            Some(Parent::Node(parent)) => current = parent,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Mesh, Skin};
    use glam::{Mat4, Vec3};

    fn translated(doc: &mut Document, name: &str, offset: [f32; 3]) -> Id<Node> {
        let mut node = Node::new(name);
        node.translation = offset;
        doc.create_node(node)
    }

    #[test]
    fn test_mesh_nodes_move_to_root_with_world_transform() {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");
        let mesh = doc.meshes.insert(Mesh::default());

        let group = translated(&mut doc, "group", [1.0, 0.0, 0.0]);
        let child = translated(&mut doc, "child", [0.0, 2.0, 0.0]);
        doc.nodes[child].mesh = Some(mesh);
        doc.add_child(Parent::Scene(scene), group);
        doc.add_child(Parent::Node(group), child);

        assert_eq!(flatten(&mut doc), 1);

        assert_eq!(doc.scenes[scene].children, vec![child]);
        assert!(!doc.nodes.contains(group));
        let world = doc.nodes[child].local_matrix();
        assert!(world.abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, 2.0, 0.0)), 1e-6));
    }

    #[test]
    fn test_skeleton_hierarchy_is_kept() {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");
        let armature = translated(&mut doc, "armature", [0.0; 3]);
        let hips = translated(&mut doc, "hips", [0.0, 1.0, 0.0]);
        let spine = translated(&mut doc, "spine", [0.0, 0.5, 0.0]);
        doc.add_child(Parent::Scene(scene), armature);
        doc.add_child(Parent::Node(armature), hips);
        doc.add_child(Parent::Node(hips), spine);
        let skin = doc.create_skin(Skin {
            joints: vec![hips, spine],
            ..Default::default()
        });
        let mesh = doc.meshes.insert(Mesh::default());
        let mut body = Node::new("body");
        body.mesh = Some(mesh);
        body.skin = Some(skin);
        let body = doc.create_node(body);
        doc.add_child(Parent::Node(armature), body);

        assert_eq!(flatten(&mut doc), 1);

        assert_eq!(doc.parent_of(body), Some(Parent::Scene(scene)));
        assert_eq!(doc.parent_of(hips), Some(Parent::Node(armature)));
        assert_eq!(doc.parent_of(spine), Some(Parent::Node(hips)));
        assert_eq!(doc.nodes[spine].translation, [0.0, 0.5, 0.0]);
    }
}

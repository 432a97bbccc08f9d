//! Removal of unused entities

use hashbrown::HashSet;

use crate::document::{Document, TextureChannel};

/// Counts of entities disposed by [`prune`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub primitives: usize,
    pub meshes: usize,
    pub nodes: usize,
    pub skins: usize,
    pub materials: usize,
    pub textures: usize,
}

impl PruneReport {
    pub fn total(&self) -> usize {
        self.primitives + self.meshes + self.nodes + self.skins + self.materials + self.textures
    }
}

/// Dispose entities nothing uses: primitives outside any mesh, meshes
/// without primitives, nodes carrying nothing, skins no node binds,
/// materials no primitive renders with, textures no material samples.
/// Scenes are kept.
pub fn prune(doc: &mut Document) -> PruneReport {
    let mut report = PruneReport::default();

    let owned: HashSet<_> = doc
        .meshes
        .iter()
        .flat_map(|(_, mesh)| mesh.primitives.iter().copied())
        .collect();
    for id in doc.primitives.ids() {
        if !owned.contains(&id) {
            doc.dispose_primitive(id);
            report.primitives += 1;
        }
    }

    for id in doc.meshes.ids() {
        if doc.meshes[id].primitives.is_empty() {
            doc.dispose_mesh(id);
            report.meshes += 1;
        }
    }

    report.nodes += prune_nodes(doc);

    let bound: HashSet<_> = doc.nodes.iter().filter_map(|(_, node)| node.skin).collect();
    for id in doc.skins.ids() {
        if !bound.contains(&id) {
            doc.dispose_skin(id);
            report.skins += 1;
        }
    }
    if report.skins > 0 {
        report.nodes += prune_nodes(doc);
    }

    let used: HashSet<_> = doc
        .primitives
        .iter()
        .filter_map(|(_, primitive)| primitive.material)
        .collect();
    for id in doc.materials.ids() {
        if !used.contains(&id) {
            doc.dispose_material(id);
            report.materials += 1;
        }
    }

    let sampled: HashSet<_> = doc
        .materials
        .iter()
        .flat_map(|(_, material)| {
            TextureChannel::ALL
                .into_iter()
                .filter_map(move |channel| material.texture(channel))
        })
        .collect();
    for id in doc.textures.ids() {
        if !sampled.contains(&id) {
            doc.dispose_texture(id);
            report.textures += 1;
        }
    }

    if report.total() > 0 {
        tracing::debug!("Pruned {:?}", report);
    }
    report
}

/// Dispose nodes unreachable from every scene, then leaves without a mesh,
/// until nothing changes. Joints and skeleton roots always stay.
pub(crate) fn prune_nodes(doc: &mut Document) -> usize {
    let mut disposed = 0;

    let reachable: HashSet<_> = doc
        .scenes
        .ids()
        .into_iter()
        .flat_map(|scene| doc.scene_nodes(scene))
        .collect();
    for id in doc.nodes.ids() {
        if !reachable.contains(&id) && !doc.is_joint(id) {
            doc.dispose_node(id);
            disposed += 1;
        }
    }

    loop {
        let leaves: Vec<_> = doc
            .nodes
            .iter()
            .filter(|(_, node)| node.children.is_empty() && node.mesh.is_none())
            .map(|(id, _)| id)
            .filter(|&id| !doc.is_joint(id))
            .collect();
        if leaves.is_empty() {
            break;
        }
        for id in leaves {
            doc.dispose_node(id);
            disposed += 1;
        }
    }
    disposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Material, Node, Parent, Primitive, Skin};

    #[test]
    fn test_prune_removes_unused_entities() {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");

        let used_texture = doc.create_texture("used", Vec::new(), "image/png");
        let orphan_texture = doc.create_texture("orphan", Vec::new(), "image/png");
        let mut material = Material::new("used");
        material.set_base_color_texture(Some(used_texture));
        let material = doc.create_material(material);
        let mut unused = Material::new("unused");
        unused.set_base_color_texture(Some(orphan_texture));
        doc.create_material(unused);

        let primitive = doc.create_primitive(Primitive::new().with_material(material));
        let mesh = doc.create_mesh("body");
        doc.meshes[mesh].primitives.push(primitive);
        doc.create_mesh("empty");
        doc.create_primitive(Primitive::new());

        let hips = doc.create_node(Node::new("hips"));
        let skin = doc.create_skin(Skin {
            joints: vec![hips],
            ..Default::default()
        });
        let mut body = Node::new("body");
        body.mesh = Some(mesh);
        body.skin = Some(skin);
        let body = doc.create_node(body);
        let empty = doc.create_node(Node::new("empty"));
        doc.create_skin(Skin::default());

        for node in [hips, body, empty] {
            doc.add_child(Parent::Scene(scene), node);
        }

        let report = prune(&mut doc);

        assert_eq!(report.primitives, 1);
        assert_eq!(report.meshes, 1);
        assert_eq!(report.nodes, 1);
        assert_eq!(report.skins, 1);
        assert_eq!(report.materials, 1);
        assert_eq!(report.textures, 1);
        assert!(doc.nodes.contains(hips));
        assert!(doc.nodes.contains(body));
        assert!(!doc.nodes.contains(empty));
        assert_eq!(doc.scenes.len(), 1);
    }

    #[test]
    fn test_freed_skeleton_is_collapsed() {
        let mut doc = Document::new();
        let scene = doc.create_scene("scene");
        let armature = doc.create_node(Node::new("armature"));
        let hips = doc.create_node(Node::new("hips"));
        doc.nodes[armature].children.push(hips);
        doc.add_child(Parent::Scene(scene), armature);
        doc.create_skin(Skin {
            skeleton: Some(armature),
            joints: vec![hips],
            ..Default::default()
        });

        let report = prune(&mut doc);

        assert_eq!(report.skins, 1);
        assert_eq!(report.nodes, 2);
        assert!(doc.nodes.is_empty());
    }

    #[test]
    fn test_orphans_are_removed() {
        let mut doc = Document::new();
        doc.create_scene("scene");
        let orphan = doc.create_node(Node::new("orphan"));
        let child = doc.create_node(Node::new("child"));
        doc.nodes[orphan].children.push(child);

        assert_eq!(prune_nodes(&mut doc), 2);
    }
}

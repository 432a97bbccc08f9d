//! Skeleton consolidation
//!
//! Folds every non-primary scene into the primary one. In merge mode the
//! first skin found becomes the only skin: its skeleton root is promoted to
//! the primary scene and every other skin is disposed, with its nodes rebound
//! to the survivor. All inputs are expected to share the same rig.

use crate::document::{Document, Id, Node, Parent, Scene, Skin};

/// Placeholder name for skinned nodes without a mesh
pub const UNNAMED_NODE: &str = "node";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkeletonReport {
    pub scenes_folded: usize,
    pub skins_disposed: usize,
    pub surviving_skin: Option<Id<Skin>>,
}

pub fn consolidate_skeletons(
    doc: &mut Document,
    primary: Id<Scene>,
    merge_skins: bool,
) -> SkeletonReport {
    let mut report = SkeletonReport::default();

    let scenes: Vec<_> = doc.scenes.ids().into_iter().filter(|&s| s != primary).collect();
    for &scene in scenes.iter().rev() {
        let children = doc.scenes[scene].children.clone();
        for &child in children.iter().rev() {
            for node in doc.subtree(child) {
                let Some(skin) = doc.nodes[node].skin else {
                    continue;
                };

                if merge_skins {
                    match report.surviving_skin {
                        None => {
                            promote_skeleton(doc, primary, skin);
                            report.surviving_skin = Some(skin);
                        }
                        Some(surviving) if surviving != skin => {
                            rebind_skin(doc, skin, surviving);
                            report.skins_disposed += 1;
                        }
                        Some(_) => {}
                    }
                }

                let name = doc.nodes[node]
                    .mesh
                    .and_then(|mesh| doc.meshes.get(mesh))
                    .map(|mesh| mesh.name.clone())
                    .unwrap_or_else(|| UNNAMED_NODE.to_string());
                doc.nodes[node].name = name;
            }

            move_to_scene(doc, primary, child);
        }

        doc.dispose_scene(scene);
        report.scenes_folded += 1;
    }

    tracing::info!(
        "Consolidated skeletons: {} scenes folded, {} skins disposed",
        report.scenes_folded,
        report.skins_disposed
    );
    report
}

/// Make the skin's skeleton root (or its first joint) a root of `primary`
/// and drop the skin's skeleton reference
fn promote_skeleton(doc: &mut Document, primary: Id<Scene>, skin: Id<Skin>) {
    let root = doc.skins[skin]
        .skeleton
        .or_else(|| doc.skins[skin].joints.first().copied());
    if let Some(root) = root {
        move_to_scene(doc, primary, root);
    }
    doc.skins[skin].skeleton = None;
}

/// Point every node bound to `skin` at `surviving`, then dispose `skin`
fn rebind_skin(doc: &mut Document, skin: Id<Skin>, surviving: Id<Skin>) {
    for (_, node) in doc.nodes.iter_mut() {
        if node.skin == Some(skin) {
            node.skin = Some(surviving);
        }
    }
    doc.dispose_skin(skin);
}

fn move_to_scene(doc: &mut Document, scene: Id<Scene>, node: Id<Node>) {
    if doc.parent_of(node) == Some(Parent::Scene(scene)) {
        return;
    }
    doc.detach_node(node);
    doc.add_child(Parent::Scene(scene), node);
}

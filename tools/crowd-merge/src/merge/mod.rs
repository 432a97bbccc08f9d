//! Document, skeleton and primitive consolidation

pub mod primitives;
pub mod reparent;
pub mod skeleton;

pub use primitives::{
    is_culled_at_lod, merge_primitives, remove_primitives_by_material, strip_secondary_skinning,
};
pub use reparent::reparent_primitives;
pub use skeleton::{consolidate_skeletons, SkeletonReport};

use crate::document::{Document, Id, Scene};

/// Name of the scene every input is folded into
pub const PRIMARY_SCENE_NAME: &str = "scene";

/// Build a fresh document holding an empty primary scene followed by every
/// entity of `sources`, in order
pub fn merge_documents(sources: Vec<Document>) -> (Document, Id<Scene>) {
    let mut target = Document::new();
    let primary = target.create_scene(PRIMARY_SCENE_NAME);
    for source in sources {
        let scenes = target.absorb(source);
        tracing::debug!("Merged document with {} scene(s)", scenes.len());
    }
    (target, primary)
}

//! In-memory asset document
//!
//! Every entity lives in an [`Arena`] and is addressed by a stable [`Id`].
//! Edges point one way only: scenes own root nodes, nodes own children and
//! reference a mesh and a skin, meshes own primitives, primitives reference
//! materials, materials reference textures. There are no back-pointers, so
//! parent lookups scan the owning edges.

mod arena;
mod material;
mod primitive;

pub use arena::{Arena, Id};
pub use material::{AlphaMode, ChannelAccessors, Material, TextureChannel};
pub use primitive::{Attribute, Mode, Primitive, Semantic};

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub name: String,
    pub children: Vec<Id<Node>>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub translation: [f32; 3],
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub children: Vec<Id<Node>>,
    pub mesh: Option<Id<Mesh>>,
    pub skin: Option<Id<Skin>>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            children: Vec::new(),
            mesh: None,
            skin: None,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from(self.translation),
        )
    }

    pub fn set_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        self.scale = scale.to_array();
        self.rotation = rotation.to_array();
        self.translation = translation.to_array();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Id<Primitive>>,
}

/// Encoded image payload
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub image: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: String,
    /// Common root of the joint hierarchy
    pub skeleton: Option<Id<Node>>,
    pub joints: Vec<Id<Node>>,
    pub inverse_bind_matrices: Option<Vec<[f32; 16]>>,
}

/// Owner of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Scene(Id<Scene>),
    Node(Id<Node>),
}

/// Asset document: owns every entity of a loaded or merged asset
#[derive(Default)]
pub struct Document {
    pub scenes: Arena<Scene>,
    pub nodes: Arena<Node>,
    pub meshes: Arena<Mesh>,
    pub primitives: Arena<Primitive>,
    pub materials: Arena<Material>,
    pub textures: Arena<Texture>,
    pub skins: Arena<Skin>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    pub fn create_scene(&mut self, name: impl Into<String>) -> Id<Scene> {
        self.scenes.insert(Scene {
            name: name.into(),
            children: Vec::new(),
        })
    }

    pub fn create_node(&mut self, node: Node) -> Id<Node> {
        self.nodes.insert(node)
    }

    pub fn create_mesh(&mut self, name: impl Into<String>) -> Id<Mesh> {
        self.meshes.insert(Mesh {
            name: name.into(),
            primitives: Vec::new(),
        })
    }

    pub fn create_primitive(&mut self, primitive: Primitive) -> Id<Primitive> {
        self.primitives.insert(primitive)
    }

    pub fn create_material(&mut self, material: Material) -> Id<Material> {
        self.materials.insert(material)
    }

    pub fn create_texture(
        &mut self,
        name: impl Into<String>,
        image: Vec<u8>,
        mime_type: &str,
    ) -> Id<Texture> {
        self.textures.insert(Texture {
            name: name.into(),
            image,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn create_skin(&mut self, skin: Skin) -> Id<Skin> {
        self.skins.insert(skin)
    }

    /// Append `child` to the children of `parent`
    pub fn add_child(&mut self, parent: Parent, child: Id<Node>) {
        match parent {
            Parent::Scene(scene) => self.scenes[scene].children.push(child),
            Parent::Node(node) => self.nodes[node].children.push(child),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Scene or node that lists `node` as a child
    pub fn parent_of(&self, node: Id<Node>) -> Option<Parent> {
        if let Some((id, _)) = self
            .scenes
            .iter()
            .find(|(_, scene)| scene.children.contains(&node))
        {
            return Some(Parent::Scene(id));
        }
        self.nodes
            .iter()
            .find(|(_, candidate)| candidate.children.contains(&node))
            .map(|(id, _)| Parent::Node(id))
    }

    /// `root` followed by its descendants, pre-order
    pub fn subtree(&self, root: Id<Node>) -> Vec<Id<Node>> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every node reachable from the scene's roots, pre-order
    pub fn scene_nodes(&self, scene: Id<Scene>) -> Vec<Id<Node>> {
        self.scenes[scene]
            .children
            .iter()
            .flat_map(|&root| self.subtree(root))
            .collect()
    }

    pub fn nodes_with_mesh(&self, mesh: Id<Mesh>) -> Vec<Id<Node>> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.mesh == Some(mesh))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn mesh_of_primitive(&self, primitive: Id<Primitive>) -> Option<Id<Mesh>> {
        self.meshes
            .iter()
            .find(|(_, mesh)| mesh.primitives.contains(&primitive))
            .map(|(id, _)| id)
    }

    /// Node is referenced as a joint or skeleton root by some skin
    pub fn is_joint(&self, node: Id<Node>) -> bool {
        self.skins
            .iter()
            .any(|(_, skin)| skin.joints.contains(&node) || skin.skeleton == Some(node))
    }

    /// Transform of `node` relative to its scene
    pub fn world_matrix(&self, node: Id<Node>) -> Mat4 {
        let mut matrix = self.nodes[node].local_matrix();
        let mut current = node;
        while let Some(Parent::Node(parent)) = self.parent_of(current) {
            matrix = self.nodes[parent].local_matrix() * matrix;
            current = parent;
        }
        matrix
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Remove `node` from the child list of its scene or parent node
    pub fn detach_node(&mut self, node: Id<Node>) {
        for (_, scene) in self.scenes.iter_mut() {
            scene.children.retain(|&child| child != node);
        }
        for (_, parent) in self.nodes.iter_mut() {
            parent.children.retain(|&child| child != node);
        }
    }

    /// Detach a primitive from whichever mesh holds it, keeping it alive
    pub fn detach_primitive(&mut self, primitive: Id<Primitive>) {
        for (_, mesh) in self.meshes.iter_mut() {
            mesh.primitives.retain(|&p| p != primitive);
        }
    }

    // ------------------------------------------------------------------
    // Disposal
    // ------------------------------------------------------------------

    /// Dispose a scene; its root nodes stay in the document
    pub fn dispose_scene(&mut self, scene: Id<Scene>) {
        self.scenes.remove(scene);
    }

    /// Dispose a node and drop every reference to it. Children are left
    /// orphaned for [`crate::geometry::prune`] to collect.
    pub fn dispose_node(&mut self, node: Id<Node>) {
        self.detach_node(node);
        for (_, skin) in self.skins.iter_mut() {
            skin.joints.retain(|&joint| joint != node);
            if skin.skeleton == Some(node) {
                skin.skeleton = None;
            }
        }
        self.nodes.remove(node);
    }

    /// Dispose a mesh together with its primitives
    pub fn dispose_mesh(&mut self, mesh: Id<Mesh>) {
        let Some(removed) = self.meshes.remove(mesh) else {
            return;
        };
        for primitive in removed.primitives {
            self.primitives.remove(primitive);
        }
        for (_, node) in self.nodes.iter_mut() {
            if node.mesh == Some(mesh) {
                node.mesh = None;
            }
        }
    }

    pub fn dispose_primitive(&mut self, primitive: Id<Primitive>) {
        self.detach_primitive(primitive);
        self.primitives.remove(primitive);
    }

    pub fn dispose_material(&mut self, material: Id<Material>) {
        for (_, primitive) in self.primitives.iter_mut() {
            if primitive.material == Some(material) {
                primitive.material = None;
            }
            if primitive.original_material == Some(material) {
                primitive.original_material = None;
            }
        }
        self.materials.remove(material);
    }

    pub fn dispose_texture(&mut self, texture: Id<Texture>) {
        for (_, material) in self.materials.iter_mut() {
            for channel in TextureChannel::ALL {
                if material.texture(channel) == Some(texture) {
                    material.set_texture(channel, None);
                }
            }
        }
        self.textures.remove(texture);
    }

    pub fn dispose_skin(&mut self, skin: Id<Skin>) {
        for (_, node) in self.nodes.iter_mut() {
            if node.skin == Some(skin) {
                node.skin = None;
            }
        }
        self.skins.remove(skin);
    }

    // ------------------------------------------------------------------
    // Merging
    // ------------------------------------------------------------------

    /// Move every entity of `other` into this document, rewriting its ids.
    /// Returns the ids of `other`'s scenes in their new home.
    pub fn absorb(&mut self, mut other: Document) -> Vec<Id<Scene>> {
        let node_offset = self.nodes.slot_count();
        let mesh_offset = self.meshes.slot_count();
        let primitive_offset = self.primitives.slot_count();
        let material_offset = self.materials.slot_count();
        let texture_offset = self.textures.slot_count();
        let skin_offset = self.skins.slot_count();
        let scene_offset = self.scenes.slot_count();

        let shift_nodes = |ids: &mut Vec<Id<Node>>| {
            for id in ids.iter_mut() {
                *id = id.shifted(node_offset);
            }
        };

        for (_, scene) in other.scenes.iter_mut() {
            shift_nodes(&mut scene.children);
        }
        for (_, node) in other.nodes.iter_mut() {
            shift_nodes(&mut node.children);
            node.mesh = node.mesh.map(|id| id.shifted(mesh_offset));
            node.skin = node.skin.map(|id| id.shifted(skin_offset));
        }
        for (_, mesh) in other.meshes.iter_mut() {
            for id in mesh.primitives.iter_mut() {
                *id = id.shifted(primitive_offset);
            }
        }
        for (_, primitive) in other.primitives.iter_mut() {
            primitive.material = primitive.material.map(|id| id.shifted(material_offset));
            primitive.original_material = primitive
                .original_material
                .map(|id| id.shifted(material_offset));
        }
        for (_, material) in other.materials.iter_mut() {
            for channel in TextureChannel::ALL {
                let shifted = material
                    .texture(channel)
                    .map(|id| id.shifted(texture_offset));
                material.set_texture(channel, shifted);
            }
        }
        for (_, skin) in other.skins.iter_mut() {
            skin.skeleton = skin.skeleton.map(|id| id.shifted(node_offset));
            shift_nodes(&mut skin.joints);
        }

        let scenes = other
            .scenes
            .ids()
            .into_iter()
            .map(|id| id.shifted(scene_offset))
            .collect();

        self.scenes.append(other.scenes);
        self.nodes.append(other.nodes);
        self.meshes.append(other.meshes);
        self.primitives.append(other.primitives);
        self.materials.append(other.materials);
        self.textures.append(other.textures);
        self.skins.append(other.skins);

        scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skinned_document(name: &str) -> Document {
        let mut doc = Document::new();
        let scene = doc.create_scene(name);
        let root = doc.create_node(Node::new("root"));
        let joint = doc.create_node(Node::new("hips"));
        doc.nodes[root].children.push(joint);

        let texture = doc.create_texture("tex", vec![1, 2, 3], "image/png");
        let mut material = Material::new(name);
        material.set_base_color_texture(Some(texture));
        let material = doc.create_material(material);

        let primitive = doc.create_primitive(Primitive::new().with_material(material));
        let mesh = doc.create_mesh(name);
        doc.meshes[mesh].primitives.push(primitive);

        let skin = doc.create_skin(Skin {
            name: name.to_string(),
            skeleton: Some(joint),
            joints: vec![joint],
            inverse_bind_matrices: None,
        });
        let mut body = Node::new("body");
        body.mesh = Some(mesh);
        body.skin = Some(skin);
        let body = doc.create_node(body);

        doc.scenes[scene].children.extend([root, body]);
        doc
    }

    #[test]
    fn test_parent_lookup_scans_edges() {
        let doc = skinned_document("a");
        let root = doc.nodes.ids()[0];
        let joint = doc.nodes.ids()[1];
        let scene = doc.scenes.ids()[0];

        assert_eq!(doc.parent_of(root), Some(Parent::Scene(scene)));
        assert_eq!(doc.parent_of(joint), Some(Parent::Node(root)));
        assert_eq!(doc.subtree(root), vec![root, joint]);
        assert!(doc.is_joint(joint));
        assert!(!doc.is_joint(root));
    }

    #[test]
    fn test_dispose_clears_references() {
        let mut doc = skinned_document("a");
        let skin = doc.skins.ids()[0];
        let texture = doc.textures.ids()[0];
        let material = doc.materials.ids()[0];
        let mesh = doc.meshes.ids()[0];

        doc.dispose_texture(texture);
        assert_eq!(doc.materials[material].base_color_texture(), None);

        doc.dispose_skin(skin);
        assert!(doc.nodes.iter().all(|(_, node)| node.skin.is_none()));

        doc.dispose_mesh(mesh);
        assert!(doc.primitives.is_empty());
        assert!(doc.nodes.iter().all(|(_, node)| node.mesh.is_none()));
    }

    #[test]
    fn test_dispose_node_removes_joint_and_child_edges() {
        let mut doc = skinned_document("a");
        let root = doc.nodes.ids()[0];
        let joint = doc.nodes.ids()[1];
        let skin = doc.skins.ids()[0];

        doc.dispose_node(joint);
        assert!(doc.nodes[root].children.is_empty());
        assert!(doc.skins[skin].joints.is_empty());
        assert_eq!(doc.skins[skin].skeleton, None);
    }

    #[test]
    fn test_absorb_rewrites_ids() {
        let mut target = skinned_document("a");
        let source = skinned_document("b");

        let scenes = target.absorb(source);
        assert_eq!(scenes.len(), 1);
        assert_eq!(target.scenes.len(), 2);
        assert_eq!(target.skins.len(), 2);

        let scene = &target.scenes[scenes[0]];
        assert_eq!(scene.name, "b");
        let body = target.nodes[scene.children[1]].clone();
        let mesh = &target.meshes[body.mesh.unwrap_or_else(|| panic!("mesh"))];
        assert_eq!(mesh.name, "b");

        let primitive = &target.primitives[mesh.primitives[0]];
        let material = &target.materials[primitive.material.unwrap_or_else(|| panic!("material"))];
        assert_eq!(material.name, "b");
        assert!(material.base_color_texture().is_some());

        let skin = &target.skins[body.skin.unwrap_or_else(|| panic!("skin"))];
        assert_eq!(skin.name, "b");
        assert_eq!(target.nodes[skin.joints[0]].name, "hips");
        assert_eq!(
            target.parent_of(skin.joints[0]),
            Some(Parent::Node(scene.children[0]))
        );
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut doc = Document::new();
        let scene = doc.create_scene("s");
        let mut parent = Node::new("parent");
        parent.translation = [1.0, 0.0, 0.0];
        let mut child = Node::new("child");
        child.translation = [0.0, 2.0, 0.0];
        let child = doc.create_node(child);
        parent.children.push(child);
        let parent = doc.create_node(parent);
        doc.add_child(Parent::Scene(scene), parent);

        let world = doc.world_matrix(child);
        assert_eq!(world.w_axis.truncate(), Vec3::new(1.0, 2.0, 0.0));
    }
}

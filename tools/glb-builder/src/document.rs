//! GLTF document construction

use crate::buffer::ViewIndex;
use gltf_json as json;

/// Builder for complete GLTF documents
///
/// Entities are appended in order and addressed by the returned indices, so
/// callers can wire cross references (node → mesh, material → texture) while
/// building.
pub struct GltfBuilder {
    nodes: Vec<json::Node>,
    meshes: Vec<json::Mesh>,
    skins: Vec<json::Skin>,
    scenes: Vec<json::Scene>,
    materials: Vec<json::Material>,
    textures: Vec<json::Texture>,
    images: Vec<json::Image>,
    buffer_byte_length: u64,
}

/// Create a node with identity transform and no attachments
pub fn empty_node(name: Option<&str>) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: name.map(str::to_string),
        rotation: None,
        scale: None,
        translation: None,
        skin: None,
        weights: None,
    }
}

impl GltfBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            meshes: Vec::new(),
            skins: Vec::new(),
            scenes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            images: Vec::new(),
            buffer_byte_length: 0,
        }
    }

    /// Set buffer byte length (required before building)
    pub fn buffer_byte_length(&mut self, length: u64) -> &mut Self {
        self.buffer_byte_length = length;
        self
    }

    /// Add a node
    pub fn add_node(&mut self, node: json::Node) -> json::Index<json::Node> {
        self.nodes.push(node);
        json::Index::new(self.nodes.len() as u32 - 1)
    }

    /// Mutable access to a previously added node (e.g. to attach children)
    pub fn node_mut(&mut self, index: json::Index<json::Node>) -> Option<&mut json::Node> {
        self.nodes.get_mut(index.value())
    }

    /// Add a mesh built from one or more primitives
    pub fn add_mesh(
        &mut self,
        name: Option<&str>,
        primitives: Vec<json::mesh::Primitive>,
    ) -> json::Index<json::Mesh> {
        self.meshes.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: name.map(str::to_string),
            primitives,
            weights: None,
        });
        json::Index::new(self.meshes.len() as u32 - 1)
    }

    /// Add a skin built by [`crate::SkinBuilder`]
    pub fn add_skin(&mut self, skin: json::Skin) -> json::Index<json::Skin> {
        self.skins.push(skin);
        json::Index::new(self.skins.len() as u32 - 1)
    }

    /// Add an image stored in a buffer view
    pub fn add_image(
        &mut self,
        name: Option<&str>,
        view: ViewIndex,
        mime_type: &str,
    ) -> json::Index<json::Image> {
        self.images.push(json::Image {
            buffer_view: Some(view.as_json_index()),
            mime_type: Some(json::image::MimeType(mime_type.to_string())),
            name: name.map(str::to_string),
            uri: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        json::Index::new(self.images.len() as u32 - 1)
    }

    /// Add a texture sampling an image with the default sampler
    pub fn add_texture(
        &mut self,
        name: Option<&str>,
        source: json::Index<json::Image>,
    ) -> json::Index<json::Texture> {
        self.textures.push(json::Texture {
            name: name.map(str::to_string),
            sampler: None,
            source,
            extensions: Default::default(),
            extras: Default::default(),
        });
        json::Index::new(self.textures.len() as u32 - 1)
    }

    /// Add a material
    pub fn add_material(&mut self, material: json::Material) -> json::Index<json::Material> {
        self.materials.push(material);
        json::Index::new(self.materials.len() as u32 - 1)
    }

    /// Add a scene
    pub fn add_scene(&mut self, name: Option<&str>, root_nodes: &[u32]) -> json::Index<json::Scene> {
        self.scenes.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: name.map(str::to_string),
            nodes: root_nodes.iter().map(|n| json::Index::new(*n)).collect(),
        });
        json::Index::new(self.scenes.len() as u32 - 1)
    }

    /// Build final GLTF Root (requires buffer views and accessors from BufferBuilder)
    pub fn build(
        self,
        buffer_views: &[json::buffer::View],
        accessors: &[json::Accessor],
        generator: &str,
    ) -> json::Root {
        let buffers = vec![json::Buffer {
            byte_length: self.buffer_byte_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }];

        json::Root {
            accessors: accessors.to_vec(),
            animations: Vec::new(),
            asset: json::Asset {
                copyright: None,
                extensions: Default::default(),
                extras: Default::default(),
                generator: Some(generator.to_string()),
                min_version: None,
                version: "2.0".to_string(),
            },
            buffers,
            buffer_views: buffer_views.to_vec(),
            cameras: Vec::new(),
            extensions: Default::default(),
            extensions_required: Vec::new(),
            extensions_used: Vec::new(),
            extras: Default::default(),
            images: self.images,
            materials: self.materials,
            meshes: self.meshes,
            nodes: self.nodes,
            samplers: Vec::new(),
            scene: if self.scenes.is_empty() {
                None
            } else {
                Some(json::Index::new(0))
            },
            scenes: self.scenes,
            skins: self.skins,
            textures: self.textures,
        }
    }
}

impl Default for GltfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

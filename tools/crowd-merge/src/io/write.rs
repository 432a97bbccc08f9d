//! [`Document`] → GLB

use anyhow::Result;
use glb_builder::json;
use glb_builder::{
    assemble_glb, empty_node, AccessorIndex, BufferBuilder, GltfBuilder, MaterialBuilder,
    SkinBuilder, Valid,
};
use hashbrown::HashMap;
use std::collections::BTreeMap;

use crate::document::{Attribute, Document, Id, Primitive, Semantic, TextureChannel};

/// Float attributes with fewer non-zero elements than this ratio are written
/// as sparse accessors
pub const SPARSE_RATIO: f32 = 1.0 / 10.0;

const GENERATOR: &str = concat!("crowd-merge ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Emit mostly-zero float attributes as sparse accessors
    pub sparse: bool,
}

/// Serialize the live entities of `doc` into one GLB with a single buffer
pub fn write_glb(doc: &Document, options: WriteOptions) -> Result<Vec<u8>> {
    let mut buffer = BufferBuilder::new();
    let mut gltf = GltfBuilder::new();

    let mut textures = HashMap::new();
    for (id, texture) in doc.textures.iter() {
        let view = buffer.pack_image(&texture.image);
        let image = gltf.add_image(Some(&texture.name), view, &texture.mime_type);
        let index = gltf.add_texture(Some(&texture.name), image);
        textures.insert(id, index.value() as u32);
    }

    let mut materials = HashMap::new();
    for (id, material) in doc.materials.iter() {
        let mut builder = MaterialBuilder::new(&material.name)
            .base_color_factor(material.base_color_factor)
            .metallic_factor(material.metallic_factor)
            .roughness_factor(material.roughness_factor)
            .emissive_factor(material.emissive_factor)
            .alpha_mode(material.alpha_mode.as_str())
            .alpha_cutoff(material.alpha_cutoff)
            .double_sided(material.double_sided);
        for channel in TextureChannel::ALL {
            let Some(&texture) = material.texture(channel).and_then(|t| textures.get(&t)) else {
                continue;
            };
            builder = match channel {
                TextureChannel::BaseColor => builder.base_color_texture(texture),
                TextureChannel::MetallicRoughness => builder.metallic_roughness_texture(texture),
                TextureChannel::Normal => builder.normal_texture(texture),
                TextureChannel::Occlusion => builder.occlusion_texture(texture),
                TextureChannel::Emissive => builder.emissive_texture(texture),
            };
        }
        let index = gltf.add_material(builder.build());
        materials.insert(id, index.value() as u32);
    }

    let mut meshes = HashMap::new();
    let mut sparse_count = 0;
    for (id, mesh) in doc.meshes.iter() {
        let primitives: Vec<_> = mesh
            .primitives
            .iter()
            .filter_map(|&p| doc.primitives.get(p))
            .map(|primitive| {
                write_primitive(primitive, &materials, &mut buffer, options, &mut sparse_count)
            })
            .collect();
        if primitives.is_empty() {
            continue;
        }
        let index = gltf.add_mesh(Some(&mesh.name), primitives);
        meshes.insert(id, index);
    }
    if sparse_count > 0 {
        tracing::debug!("Wrote {} sparse accessors", sparse_count);
    }

    let mut nodes = HashMap::new();
    for (id, node) in doc.nodes.iter() {
        let mut out = empty_node(Some(&node.name));
        if node.translation != [0.0; 3] {
            out.translation = Some(node.translation);
        }
        if node.rotation != [0.0, 0.0, 0.0, 1.0] {
            out.rotation = Some(json::scene::UnitQuaternion(node.rotation));
        }
        if node.scale != [1.0; 3] {
            out.scale = Some(node.scale);
        }
        out.mesh = node.mesh.and_then(|mesh| meshes.get(&mesh).copied());
        nodes.insert(id, gltf.add_node(out));
    }

    let node_indices = |ids: &[Id<crate::document::Node>]| -> Vec<u32> {
        ids.iter()
            .filter_map(|id| nodes.get(id))
            .map(|index| index.value() as u32)
            .collect()
    };

    let mut skins = HashMap::new();
    for (id, skin) in doc.skins.iter() {
        let skeleton = skin
            .skeleton
            .and_then(|node| nodes.get(&node))
            .map(|index| index.value() as u32);
        let built = SkinBuilder::new(Some(&skin.name))
            .skeleton(skeleton)
            .joints(&node_indices(&skin.joints))
            .inverse_bind_matrices(skin.inverse_bind_matrices.as_deref().unwrap_or_default())
            .build(&mut buffer);
        skins.insert(id, gltf.add_skin(built));
    }

    for (id, node) in doc.nodes.iter() {
        let children = node_indices(&node.children);
        let skin = node.skin.and_then(|skin| skins.get(&skin).copied());
        if let Some(out) = gltf.node_mut(nodes[&id]) {
            if !children.is_empty() {
                out.children = Some(children.into_iter().map(json::Index::new).collect());
            }
            out.skin = skin;
        }
    }

    for (_, scene) in doc.scenes.iter() {
        gltf.add_scene(Some(&scene.name), &node_indices(&scene.children));
    }

    gltf.buffer_byte_length(buffer.data().len() as u64);
    let root = gltf.build(buffer.views(), buffer.accessors(), GENERATOR);
    assemble_glb(&root, buffer.data())
}

fn write_primitive(
    primitive: &Primitive,
    materials: &HashMap<Id<crate::document::Material>, u32>,
    buffer: &mut BufferBuilder,
    options: WriteOptions,
    sparse_count: &mut usize,
) -> json::mesh::Primitive {
    let mut attributes = BTreeMap::new();
    for (&semantic, attribute) in &primitive.attributes {
        let accessor = if semantic == Semantic::Position {
            match attribute {
                Attribute::Vec3(positions) => buffer.pack_positions(positions),
                other => pack_attribute(other, buffer),
            }
        } else if options.sparse && is_sparse_candidate(attribute) {
            *sparse_count += 1;
            pack_sparse(attribute, buffer).unwrap_or_else(|| pack_attribute(attribute, buffer))
        } else {
            pack_attribute(attribute, buffer)
        };
        attributes.insert(Valid(semantic.to_json()), accessor.as_json_index());
    }

    let indices = primitive
        .indices
        .as_ref()
        .map(|indices| buffer.pack_indices(indices).as_json_index());

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices,
        material: primitive
            .material
            .and_then(|m| materials.get(&m))
            .map(|&index| json::Index::new(index)),
        mode: Valid(primitive.mode.to_json()),
        targets: None,
    }
}

fn pack_attribute(attribute: &Attribute, buffer: &mut BufferBuilder) -> AccessorIndex {
    match attribute {
        Attribute::Vec2(data) => buffer.pack_vec2(data),
        Attribute::Vec3(data) => buffer.pack_vec3(data),
        Attribute::Vec4(data) => buffer.pack_vec4(data),
        Attribute::Joints(data) => {
            if data.iter().flatten().all(|&j| j <= u8::MAX as u16) {
                let narrow: Vec<[u8; 4]> = data
                    .iter()
                    .map(|j| [j[0] as u8, j[1] as u8, j[2] as u8, j[3] as u8])
                    .collect();
                buffer.pack_joints(&narrow)
            } else {
                buffer.pack_joints_u16(data)
            }
        }
    }
}

fn pack_sparse(attribute: &Attribute, buffer: &mut BufferBuilder) -> Option<AccessorIndex> {
    match attribute {
        Attribute::Vec2(data) => buffer.pack_sparse_f32(bytemuck::cast_slice(data), 2),
        Attribute::Vec3(data) => buffer.pack_sparse_f32(bytemuck::cast_slice(data), 3),
        Attribute::Vec4(data) => buffer.pack_sparse_f32(bytemuck::cast_slice(data), 4),
        Attribute::Joints(_) => None,
    }
}

/// Float attribute whose non-zero elements are rarer than [`SPARSE_RATIO`].
/// All-zero data stays dense so readers never see a view-less accessor.
fn is_sparse_candidate(attribute: &Attribute) -> bool {
    fn ratio<const N: usize>(data: &[[f32; N]]) -> Option<f32> {
        if data.is_empty() {
            return None;
        }
        let non_zero = data
            .iter()
            .filter(|element| element.iter().any(|&c| c != 0.0))
            .count();
        Some(non_zero as f32 / data.len() as f32)
    }

    let ratio = match attribute {
        Attribute::Vec2(data) => ratio(data),
        Attribute::Vec3(data) => ratio(data),
        Attribute::Vec4(data) => ratio(data),
        Attribute::Joints(_) => None,
    };
    matches!(ratio, Some(r) if r > 0.0 && r < SPARSE_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Material, Node};
    use crate::io::read_glb;

    fn triangle_document(colors: Vec<[f32; 4]>) -> Document {
        let mut doc = Document::new();
        let texture = doc.create_texture("albedo", vec![0x89, b'P', b'N', b'G'], "image/png");
        let mut material = Material::new("skin");
        material.set_base_color_texture(Some(texture));
        let material = doc.create_material(material);

        let primitive = Primitive::new()
            .with_attribute(
                Semantic::Position,
                Attribute::Vec3(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            )
            .with_attribute(Semantic::Color(0), Attribute::Vec4(colors))
            .with_indices(vec![0, 1, 2])
            .with_material(material);
        let primitive = doc.create_primitive(primitive);
        let mesh = doc.create_mesh("body");
        doc.meshes[mesh].primitives.push(primitive);

        let mut node = Node::new("body");
        node.mesh = Some(mesh);
        node.translation = [0.0, 1.0, 0.0];
        let node = doc.create_node(node);
        let scene = doc.create_scene("Scene");
        doc.scenes[scene].children.push(node);
        doc
    }

    #[test]
    fn test_write_then_read_preserves_structure() {
        let doc = triangle_document(vec![[1.0; 4]; 3]);
        let glb = write_glb(&doc, WriteOptions::default()).unwrap();
        let back = read_glb(&glb, None).unwrap();

        assert_eq!(back.scenes.len(), 1);
        assert_eq!(back.meshes.len(), 1);
        assert_eq!(back.textures.len(), 1);

        let (_, node) = back.nodes.iter().next().unwrap();
        assert_eq!(node.name, "body");
        assert_eq!(node.translation, [0.0, 1.0, 0.0]);

        let (_, primitive) = back.primitives.iter().next().unwrap();
        assert_eq!(primitive.indices.as_deref(), Some(&[0, 1, 2][..]));
        let material = &back.materials[primitive.material.unwrap()];
        assert_eq!(material.name, "skin");
        let texture = &back.textures[material.base_color_texture().unwrap()];
        assert_eq!(texture.image, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_sparse_candidate_threshold() {
        let mut mostly_zero = vec![[0.0; 4]; 20];
        mostly_zero[3] = [1.0, 0.0, 0.0, 0.0];
        assert!(is_sparse_candidate(&Attribute::Vec4(mostly_zero)));
        assert!(!is_sparse_candidate(&Attribute::Vec4(vec![[1.0; 4]; 20])));
        assert!(!is_sparse_candidate(&Attribute::Vec4(vec![[0.0; 4]; 20])));
        assert!(!is_sparse_candidate(&Attribute::Joints(vec![[0; 4]; 20])));
    }

    #[test]
    fn test_sparse_attribute_reads_back() {
        let mut colors = vec![[0.0; 4]; 30];
        colors[7] = [0.5, 0.25, 0.0, 1.0];
        let mut doc = triangle_document(vec![[0.0; 4]; 3]);
        let primitive = doc.primitives.ids()[0];
        doc.primitives[primitive].attributes.insert(
            Semantic::Position,
            Attribute::Vec3(vec![[0.0; 3]; 30]),
        );
        doc.primitives[primitive]
            .attributes
            .insert(Semantic::Color(0), Attribute::Vec4(colors.clone()));

        let glb = write_glb(&doc, WriteOptions { sparse: true }).unwrap();
        let gltf = gltf::Gltf::from_slice(&glb).unwrap();
        assert!(gltf.accessors().any(|a| a.sparse().is_some()));

        let back = read_glb(&glb, None).unwrap();
        let (_, primitive) = back.primitives.iter().next().unwrap();
        assert_eq!(primitive.attribute(Semantic::Color(0)), Some(&Attribute::Vec4(colors)));
    }
}

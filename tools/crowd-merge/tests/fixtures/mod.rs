//! Programmatic character GLBs for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use crowd_merge::texture;
use glb_builder::{
    assemble_glb, empty_node, json, BufferBuilder, GltfBuilder, MaterialBuilder, MeshBuilder,
    SkinBuilder, IDENTITY_MAT4,
};
use image::{Rgba, RgbaImage};

/// Edge length of the generated base-color textures
pub const TEXTURE_SIZE: u32 = 64;

/// Distinct opaque colors, one per generated asset
pub const COLORS: [[u8; 4]; 4] = [
    [255, 0, 0, 255],
    [0, 255, 0, 255],
    [0, 0, 255, 255],
    [255, 255, 0, 255],
];

/// UV corners of every generated quad, kept off the tile edges
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.1, 0.1], [0.9, 0.1], [0.9, 0.9], [0.1, 0.9]];

/// Options for one generated character
#[derive(Debug, Clone)]
pub struct Character {
    pub name: String,
    pub material: String,
    pub color: [u8; 4],
    /// X offset of the quad, used to tell assets apart after merging
    pub offset: f32,
}

impl Character {
    pub fn new(name: &str, color: [u8; 4], offset: f32) -> Self {
        Self {
            name: name.to_string(),
            material: format!("{name}-material"),
            color,
            offset,
        }
    }

    pub fn material(mut self, name: &str) -> Self {
        self.material = name.to_string();
        self
    }
}

fn solid_png(color: [u8; 4]) -> Vec<u8> {
    let raster = RgbaImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, Rgba(color));
    texture::encode(&raster, "image/png").unwrap()
}

/// Armature root holding a hips joint and one skinned quad mesh whose
/// material samples a solid-color texture
pub fn character_glb(character: &Character) -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let x = character.offset;
    let mesh = MeshBuilder::new()
        .positions(&[[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x + 1.0, 1.0, 0.0], [x, 1.0, 0.0]])
        .normals(&[[0.0, 0.0, 1.0]; 4])
        .uvs(&QUAD_UVS)
        .joints(&[[0, 0, 0, 0]; 4])
        .weights(&[[1.0, 0.0, 0.0, 0.0]; 4])
        .indices(&[0, 1, 2, 0, 2, 3])
        .build(&mut buffer);
    let image_view = buffer.pack_image(&solid_png(character.color));

    let mut gltf = GltfBuilder::new();
    let image = gltf.add_image(Some(&character.name), image_view, "image/png");
    let texture = gltf.add_texture(Some(&character.name), image);
    let material = gltf.add_material(
        MaterialBuilder::new(&character.material)
            .base_color_texture(texture.value() as u32)
            .build(),
    );
    let mesh = gltf.add_mesh(
        Some(&character.name),
        vec![mesh.primitive(Some(material.value() as u32))],
    );

    let armature = gltf.add_node(empty_node(Some("Armature")));
    let hips = gltf.add_node(empty_node(Some("Hips")));
    let mut body = empty_node(Some("Body"));
    body.mesh = Some(mesh);
    let body = gltf.add_node(body);
    let skin = SkinBuilder::new(Some(&character.name))
        .skeleton(Some(hips.value() as u32))
        .joint(hips.value() as u32, IDENTITY_MAT4)
        .build(&mut buffer);
    let skin = gltf.add_skin(skin);
    if let Some(node) = gltf.node_mut(body) {
        node.skin = Some(skin);
    }
    if let Some(node) = gltf.node_mut(armature) {
        node.children = Some(vec![hips, body]);
    }
    gltf.add_scene(Some("Scene"), &[armature.value() as u32]);

    gltf.buffer_byte_length(buffer.data().len() as u64);
    let root = gltf.build(buffer.views(), buffer.accessors(), "crowd-merge fixtures");
    assemble_glb(&root, buffer.data()).unwrap()
}

/// Write `characters` as GLB files into `dir`, returning their paths
pub fn write_characters(dir: &Path, characters: &[Character]) -> Vec<PathBuf> {
    characters
        .iter()
        .map(|character| {
            let path = dir.join(format!("{}.glb", character.name));
            std::fs::write(&path, character_glb(character)).unwrap();
            path
        })
        .collect()
}

/// Four characters with distinct colors and quad offsets
pub fn four_characters() -> Vec<Character> {
    COLORS
        .iter()
        .enumerate()
        .map(|(i, &color)| Character::new(&format!("character{i}"), color, i as f32 * 10.0))
        .collect()
}

/// Asset index of a merged vertex, recovered from its X position
pub fn asset_of(position: [f32; 3]) -> usize {
    (position[0] / 10.0).floor() as usize
}

pub fn json_root(bytes: &[u8]) -> json::Root {
    gltf::Gltf::from_slice(bytes).unwrap().document.into_json()
}

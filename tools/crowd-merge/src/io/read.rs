//! GLB/glTF → [`Document`]

use anyhow::{bail, Context, Result};
use base64::Engine;
use std::path::Path;

use crate::document::{
    AlphaMode, Attribute, Document, Id, Material, Mode, Node, Primitive, Semantic, Skin, Texture,
};

/// Parse a GLB (or embedded glTF) payload. `base` resolves external URIs.
pub fn read_glb(bytes: &[u8], base: Option<&Path>) -> Result<Document> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).context("Failed to parse glTF container")?;
    let buffers =
        gltf::import_buffers(&document, base, blob).context("Failed to load glTF buffers")?;

    let mut doc = Document::new();

    let textures = read_images(&mut doc, &document, &buffers, base)?;
    let materials: Vec<_> = document
        .materials()
        .map(|material| doc.create_material(read_material(&material, &textures)))
        .collect();

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let mesh_id = doc.create_mesh(mesh.name().unwrap_or_default());
        for primitive in mesh.primitives() {
            let mut out = read_primitive(&primitive, &buffers);
            out.material = primitive
                .material()
                .index()
                .and_then(|index| materials.get(index).copied());
            let primitive_id = doc.create_primitive(out);
            doc.meshes[mesh_id].primitives.push(primitive_id);
        }
        meshes.push(mesh_id);
    }

    // Nodes first, then edges, since children and joints refer forward
    let nodes: Vec<Id<Node>> = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            let mut out = Node::new(node.name().unwrap_or_default());
            out.translation = translation;
            out.rotation = rotation;
            out.scale = scale;
            out.mesh = node.mesh().and_then(|mesh| meshes.get(mesh.index()).copied());
            doc.create_node(out)
        })
        .collect();

    for node in document.nodes() {
        let id = nodes[node.index()];
        doc.nodes[id].children = node.children().map(|child| nodes[child.index()]).collect();
    }

    let mut skins = Vec::new();
    for skin in document.skins() {
        let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
        let inverse_bind_matrices = reader
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(bytemuck::cast::<[[f32; 4]; 4], [f32; 16]>).collect());
        skins.push(doc.create_skin(Skin {
            name: skin.name().unwrap_or_default().to_string(),
            skeleton: skin.skeleton().map(|node| nodes[node.index()]),
            joints: skin.joints().map(|node| nodes[node.index()]).collect(),
            inverse_bind_matrices,
        }));
    }

    for node in document.nodes() {
        if let Some(skin) = node.skin() {
            doc.nodes[nodes[node.index()]].skin = Some(skins[skin.index()]);
        }
    }

    for scene in document.scenes() {
        let id = doc.create_scene(scene.name().unwrap_or_default());
        doc.scenes[id].children = scene.nodes().map(|node| nodes[node.index()]).collect();
    }

    if doc.scenes.is_empty() {
        let roots: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|&node| doc.parent_of(node).is_none())
            .collect();
        let id = doc.create_scene("Scene");
        doc.scenes[id].children = roots;
    }

    tracing::debug!(
        "Read document: {} nodes, {} meshes, {} materials, {} textures, {} skins",
        doc.nodes.len(),
        doc.meshes.len(),
        doc.materials.len(),
        doc.textures.len(),
        doc.skins.len()
    );

    Ok(doc)
}

fn read_images(
    doc: &mut Document,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    base: Option<&Path>,
) -> Result<Vec<Id<Texture>>> {
    let mut textures = Vec::new();
    for image in document.images() {
        let name = image.name().unwrap_or_default();
        let (bytes, mime_type) = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer = &buffers[view.buffer().index()];
                let start = view.offset();
                let end = start + view.length();
                let Some(bytes) = buffer.get(start..end) else {
                    bail!("Image {:?} buffer view is out of bounds", name);
                };
                (bytes.to_vec(), mime_type.to_string())
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                read_uri(uri, mime_type, base).with_context(|| format!("Failed to load image {:?}", uri))?
            }
        };
        textures.push(doc.create_texture(name, bytes, &mime_type));
    }
    Ok(textures)
}

fn read_uri(uri: &str, mime_type: Option<&str>, base: Option<&Path>) -> Result<(Vec<u8>, String)> {
    if let Some(rest) = uri.strip_prefix("data:") {
        let Some((header, payload)) = rest.split_once(',') else {
            bail!("Malformed data URI");
        };
        let Some(mime) = header.strip_suffix(";base64") else {
            bail!("Only base64 data URIs are supported");
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("Invalid base64 payload")?;
        return Ok((bytes, mime_type.unwrap_or(mime).to_string()));
    }

    let path = match base {
        Some(base) => base.join(uri),
        None => Path::new(uri).to_path_buf(),
    };
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
    let mime = match mime_type {
        Some(mime) => mime.to_string(),
        None => mime_from_extension(&path).to_string(),
    };
    Ok((bytes, mime))
}

fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            "image/jpeg"
        }
        _ => "image/png",
    }
}

fn read_material(material: &gltf::Material, textures: &[Id<Texture>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let lookup = |texture: gltf::Texture| textures.get(texture.source().index()).copied();

    let mut out = Material::new(material.name().unwrap_or_default());
    out.base_color_factor = pbr.base_color_factor();
    out.metallic_factor = pbr.metallic_factor();
    out.roughness_factor = pbr.roughness_factor();
    out.emissive_factor = material.emissive_factor();
    out.alpha_mode = match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
        gltf::material::AlphaMode::Mask => AlphaMode::Mask,
        gltf::material::AlphaMode::Blend => AlphaMode::Blend,
    };
    out.alpha_cutoff = material.alpha_cutoff();
    out.double_sided = material.double_sided();

    out.set_base_color_texture(pbr.base_color_texture().and_then(|i| lookup(i.texture())));
    out.set_metallic_roughness_texture(
        pbr.metallic_roughness_texture()
            .and_then(|i| lookup(i.texture())),
    );
    out.set_normal_texture(material.normal_texture().and_then(|i| lookup(i.texture())));
    out.set_occlusion_texture(
        material
            .occlusion_texture()
            .and_then(|i| lookup(i.texture())),
    );
    out.set_emissive_texture(material.emissive_texture().and_then(|i| lookup(i.texture())));
    out
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Primitive {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let mut out = Primitive::new();
    out.mode = Mode::from_gltf(primitive.mode());

    for (semantic, _) in primitive.attributes() {
        let Some(semantic) = Semantic::from_gltf(&semantic) else {
            continue;
        };
        let attribute = match semantic {
            Semantic::Position => reader.read_positions().map(|it| Attribute::Vec3(it.collect())),
            Semantic::Normal => reader.read_normals().map(|it| Attribute::Vec3(it.collect())),
            Semantic::Tangent => reader.read_tangents().map(|it| Attribute::Vec4(it.collect())),
            Semantic::TexCoord(set) => reader
                .read_tex_coords(set)
                .map(|it| Attribute::Vec2(it.into_f32().collect())),
            Semantic::Color(set) => reader
                .read_colors(set)
                .map(|it| Attribute::Vec4(it.into_rgba_f32().collect())),
            Semantic::Joints(set) => reader
                .read_joints(set)
                .map(|it| Attribute::Joints(it.into_u16().collect())),
            Semantic::Weights(set) => reader
                .read_weights(set)
                .map(|it| Attribute::Vec4(it.into_f32().collect())),
        };
        if let Some(attribute) = attribute {
            out.attributes.insert(semantic, attribute);
        }
    }

    out.indices = reader.read_indices().map(|it| it.into_u32().collect());
    out
}

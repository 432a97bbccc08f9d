//! Size reporting and structure inspection

use serde::Serialize;

use crate::document::{Document, Mode};
use crate::texture;

const SIZE_UNITS: [&str; 8] = ["KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Format a byte count with 1024-based units and two decimals
pub fn human_file_size(bytes: u64) -> String {
    const THRESHOLD: f64 = 1024.0;
    if (bytes as f64) < THRESHOLD {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    value /= THRESHOLD;
    while (value * 100.0).round() / 100.0 >= THRESHOLD && unit < SIZE_UNITS.len() - 1 {
        value /= THRESHOLD;
        unit += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Signed size change in whole percent, negative when the output shrank
pub fn size_difference_percent(before: u64, after: u64) -> i64 {
    if before == 0 {
        return 0;
    }
    let reduction = (before as f64 - after as f64) / before as f64 * 100.0;
    -(reduction.floor() as i64)
}

/// Aggregate payload sizes in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sizes {
    pub total: u64,
    pub meshes: u64,
    pub textures: u64,
    /// Uploaded RGBA8 size including a full mip chain
    pub vram: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneInfo {
    pub name: String,
    pub root_nodes: usize,
    pub nodes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshInfo {
    pub name: String,
    pub primitives: usize,
    pub mode: Vec<&'static str>,
    pub vertices: usize,
    pub gl_primitives: usize,
    pub attributes: Vec<String>,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialInfo {
    pub name: String,
    pub alpha_mode: &'static str,
    pub double_sided: bool,
    pub textures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextureInfo {
    pub name: String,
    pub mime_type: String,
    pub resolution: Option<String>,
    pub size: u64,
    pub gpu_size: u64,
}

/// Per-entity listing of a document
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub scenes: Vec<SceneInfo>,
    pub meshes: Vec<MeshInfo>,
    pub materials: Vec<MaterialInfo>,
    pub textures: Vec<TextureInfo>,
    pub skins: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub data: Inspection,
    pub sizes: Sizes,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.data)
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Points => "POINTS",
        Mode::Lines => "LINES",
        Mode::LineLoop => "LINE_LOOP",
        Mode::LineStrip => "LINE_STRIP",
        Mode::Triangles => "TRIANGLES",
        Mode::TriangleStrip => "TRIANGLE_STRIP",
        Mode::TriangleFan => "TRIANGLE_FAN",
    }
}

fn gl_primitive_count(mode: Mode, indices: usize) -> usize {
    match mode {
        Mode::Points => indices,
        Mode::Lines => indices / 2,
        Mode::LineLoop => indices,
        Mode::LineStrip => indices.saturating_sub(1),
        Mode::Triangles => indices / 3,
        Mode::TriangleStrip | Mode::TriangleFan => indices.saturating_sub(2),
    }
}

/// Mip-chained RGBA8 footprint of a `width × height` texture
pub fn gpu_size(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 4 * 4 / 3
}

pub fn inspect(doc: &Document) -> Report {
    let scenes = doc
        .scenes
        .iter()
        .map(|(id, scene)| SceneInfo {
            name: scene.name.clone(),
            root_nodes: scene.children.len(),
            nodes: doc.scene_nodes(id).len(),
        })
        .collect();

    let meshes: Vec<MeshInfo> = doc
        .meshes
        .iter()
        .map(|(_, mesh)| {
            let primitives: Vec<_> = mesh
                .primitives
                .iter()
                .filter_map(|&id| doc.primitives.get(id))
                .collect();
            let mut mode: Vec<_> = primitives.iter().map(|p| mode_name(p.mode)).collect();
            mode.dedup();
            let mut attributes: Vec<String> = primitives
                .iter()
                .flat_map(|p| p.attributes.keys().map(|s| format!("{:?}", s)))
                .collect();
            attributes.sort();
            attributes.dedup();
            MeshInfo {
                name: mesh.name.clone(),
                primitives: primitives.len(),
                mode,
                vertices: primitives.iter().map(|p| p.vertex_count()).sum(),
                gl_primitives: primitives
                    .iter()
                    .map(|p| gl_primitive_count(p.mode, p.indices_or_sequential().len()))
                    .sum(),
                attributes,
                size: primitives.iter().map(|p| p.byte_size() as u64).sum(),
            }
        })
        .collect();

    let materials = doc
        .materials
        .iter()
        .map(|(_, material)| MaterialInfo {
            name: material.name.clone(),
            alpha_mode: material.alpha_mode.as_str(),
            double_sided: material.double_sided,
            textures: crate::document::TextureChannel::ALL
                .into_iter()
                .filter(|&c| material.texture(c).is_some())
                .count(),
        })
        .collect();

    let textures: Vec<TextureInfo> = doc
        .textures
        .iter()
        .map(|(_, tex)| {
            let dimensions = texture::dimensions(&tex.image)
                .inspect_err(|err| tracing::debug!("No dimensions for {:?}: {:#}", tex.name, err))
                .ok();
            TextureInfo {
                name: tex.name.clone(),
                mime_type: tex.mime_type.clone(),
                resolution: dimensions.map(|(w, h)| format!("{}x{}", w, h)),
                size: tex.image.len() as u64,
                gpu_size: dimensions.map_or(0, |(w, h)| gpu_size(w, h)),
            }
        })
        .collect();

    let mut sizes = Sizes {
        meshes: meshes.iter().map(|m| m.size).sum(),
        textures: textures.iter().map(|t| t.size).sum(),
        vram: textures.iter().map(|t| t.gpu_size).sum(),
        ..Default::default()
    };
    sizes.total = sizes.meshes + sizes.textures;

    Report {
        data: Inspection {
            scenes,
            meshes,
            materials,
            textures,
            skins: doc.skins.len(),
        },
        sizes,
    }
}

/// Lines of the size summary printed after a run
pub fn size_summary(before: u64, after: u64, sizes: &Sizes) -> Vec<String> {
    vec![
        "Sizes:".to_string(),
        format!("    Before\t{}", human_file_size(before)),
        format!("    After\t{}", human_file_size(after)),
        format!("    Difference\t{}%", size_difference_percent(before, after)),
        format!("    Meshes\t{}", human_file_size(sizes.meshes)),
        format!("    Textures\t{}", human_file_size(sizes.textures)),
        format!("    VRAM\t{}", human_file_size(sizes.vram)),
    ]
}

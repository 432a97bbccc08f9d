//! End-to-end consolidation run

use anyhow::{Context, Result};
use std::time::Instant;

use crate::atlas::{self, AtlasLayout, AtlasSlot};
use crate::config::MergeOptions;
use crate::document::{Document, Id, Material, Mesh, Scene};
use crate::geometry::{self, GeometryCodec};
use crate::io::{self, WriteOptions};
use crate::merge;
use crate::report::{self, Report};
use crate::texture::{self, ResizeMode, TextureCleanup};

/// Name of the shared material in merge mode
pub const SHARED_MATERIAL_NAME: &str = "main";

/// Result of [`process`]: the consolidated document and run statistics
pub struct Processed {
    pub document: Document,
    pub scene: Id<Scene>,
    /// Present in merge mode
    pub layout: Option<AtlasLayout>,
    pub vertices_before: usize,
    pub vertices_after: usize,
}

/// Statistics of a complete file-to-file run
#[derive(Debug)]
pub struct RunReport {
    pub size_before: u64,
    pub size_after: u64,
    pub layout: Option<AtlasLayout>,
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub report: Report,
}

/// Consolidate already-loaded documents according to `options`
pub fn process(
    sources: Vec<Document>,
    options: &MergeOptions,
    codec: Option<&dyn GeometryCodec>,
) -> Result<Processed> {
    let lod = options.lod;
    tracing::info!("Documents: {}", sources.len());

    let (mut doc, scene) = merge::merge_documents(sources);

    if lod.level() >= 1 {
        merge::remove_primitives_by_material(&mut doc, |material| {
            merge::is_culled_at_lod(&material.name, lod)
        });
        geometry::prune(&mut doc);
    }

    let skeletons = merge::consolidate_skeletons(&mut doc, scene, options.merge);
    tracing::debug!("Skeletons: {:?}", skeletons);

    let mut texture_size = options.initial_texture_size();
    let mut shared = None;
    let mut layout = None;
    if options.merge {
        let material = doc.create_material(Material::new(SHARED_MATERIAL_NAME));
        let count = if doc.meshes.is_empty() {
            0
        } else {
            merge::reparent_primitives(&mut doc, material)?;
            let mesh = first_mesh(&doc)?;
            doc.meshes[mesh].primitives.len() as u32
        };
        tracing::info!("Primitives: {}", count);

        let atlas_layout = AtlasLayout::new(count, lod.atlas_resolution())?;
        texture_size = atlas_layout.tile_size();
        tracing::info!(
            "Atlas tiles: {}, size: {}x{}, resolution: {}x{}",
            atlas_layout.tiles_count(),
            atlas_layout.atlas_width(),
            atlas_layout.atlas_width(),
            atlas_layout.resolution(),
            atlas_layout.resolution()
        );
        tracing::info!("Texture size: {}", texture_size);
        shared = Some(material);
        layout = Some(atlas_layout);
    }

    merge::strip_secondary_skinning(&mut doc);
    if let Some(layout) = &layout {
        let mesh = first_mesh(&doc)?;
        let remapped = atlas::remap_mesh_uvs(&mut doc, mesh, layout.atlas_width());
        tracing::debug!("Remapped {} UV sets", remapped);
    }

    tracing::info!("Textures: {}", doc.textures.len());
    if lod.level() > 0 {
        texture::cleanup_textures(&mut doc, TextureCleanup::for_lod(lod));
    }

    normalize_materials(&mut doc);

    if options.should_resize(texture_size) {
        tracing::info!("Resizing Textures: {}x{}", texture_size, texture_size);
        let mode = if options.merge {
            ResizeMode::Exact
        } else {
            ResizeMode::FitWithin
        };
        texture::resize_textures(&mut doc, texture_size, mode)?;
    }

    if let (Some(layout), Some(material)) = (&layout, shared) {
        let slots = AtlasSlot::for_lod(lod);
        let mut atlases = atlas::create_atlases(
            &mut doc,
            layout,
            material,
            &slots,
            options.atlas_format.mime_type(),
        );
        let mesh = first_mesh(&doc)?;
        let stats = atlas::copy_textures_to_atlases(&doc, mesh, &mut atlases, layout)?;
        tracing::debug!("Atlas compositing: {:?}", stats);
        for atlas in &atlases {
            atlas.upload(&mut doc)?;
        }
    }

    let vertices_before = geometry::vertex_count(&doc, scene);

    if lod.level() > 0 {
        geometry::weld(&mut doc);
        geometry::simplify(&mut doc, 0.0, lod.simplify_error())?;
    }

    if options.merge {
        merge::merge_primitives(&mut doc)?;
    }

    geometry::prune(&mut doc);
    geometry::flatten(&mut doc);
    geometry::weld(&mut doc);

    if let Some(level) = options.draco {
        geometry::compress_geometry(&mut doc, codec, level)?;
    }

    let vertices_after = geometry::vertex_count(&doc, scene);
    if lod.level() > 0 && vertices_before > 0 {
        let reduced = (1.0 - vertices_after as f64 / vertices_before as f64) * 100.0;
        tracing::info!(
            "Vertices Reduced {}% from: {} to: {}",
            reduced.round(),
            vertices_before,
            vertices_after
        );
    }

    Ok(Processed {
        document: doc,
        scene,
        layout,
        vertices_before,
        vertices_after,
    })
}

/// Load the inputs, consolidate, write the output and report sizes
pub fn run(options: &MergeOptions, codec: Option<&dyn GeometryCodec>) -> Result<RunReport> {
    let start = Instant::now();
    options.validate()?;

    let params = options.describe();
    if !params.is_empty() {
        tracing::info!("Params: {}", params.join(", "));
    }

    let mut size_before = 0;
    let mut sources = Vec::with_capacity(options.files.len());
    for path in &options.files {
        let metadata =
            std::fs::metadata(path).with_context(|| format!("Failed to stat input {:?}", path))?;
        size_before += metadata.len();
        sources.push(io::load(path)?);
    }

    let processed = process(sources, options, codec)?;

    let size_after = io::save(&processed.document, &options.output, WriteOptions { sparse: true })?
        as u64;
    tracing::info!("Wrote {:?}", options.output);

    let report = report::inspect(&processed.document);
    for line in report::size_summary(size_before, size_after, &report.sizes) {
        tracing::info!("{}", line);
    }
    if options.inspect {
        println!("{}", report.to_json().context("Failed to serialize inspection")?);
    }

    tracing::info!("Elapsed: {}ms", start.elapsed().as_millis());
    Ok(RunReport {
        size_before,
        size_after,
        layout: processed.layout,
        vertices_before: processed.vertices_before,
        vertices_after: processed.vertices_after,
        report,
    })
}

/// Zero emissive factors and alpha cutoffs on every material
pub fn normalize_materials(doc: &mut Document) {
    for (_, material) in doc.materials.iter_mut() {
        material.emissive_factor = [0.0; 3];
        material.alpha_cutoff = Some(0.0);
    }
}

fn first_mesh(doc: &Document) -> Result<Id<Mesh>> {
    doc.meshes
        .ids()
        .first()
        .copied()
        .context("Document has no meshes")
}

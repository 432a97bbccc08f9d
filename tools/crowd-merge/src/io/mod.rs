//! GLB reading and writing

mod read;
mod write;

pub use read::read_glb;
pub use write::{write_glb, WriteOptions, SPARSE_RATIO};

use anyhow::{Context, Result};
use std::path::Path;

use crate::document::Document;

/// Load a GLB/glTF file, resolving external resources next to it
pub fn load(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    read_glb(&bytes, path.parent()).with_context(|| format!("Failed to load asset {:?}", path))
}

/// Write `doc` as a GLB file, returning the written byte count
pub fn save(doc: &Document, path: &Path, options: WriteOptions) -> Result<usize> {
    let bytes = write_glb(doc, options)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(bytes.len())
}

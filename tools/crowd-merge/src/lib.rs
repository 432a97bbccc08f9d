//! crowd-merge library
//!
//! Consolidates several skinned character GLBs into one asset for crowd
//! rendering: one skeleton, one mesh with one primitive, one material whose
//! textures are per-slot atlases. Optional detail reduction culls parts,
//! drops texture slots and simplifies geometry.

pub mod atlas;
pub mod config;
pub mod document;
pub mod geometry;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod texture;

pub use config::{load_job, AtlasFormat, ConfigError, Lod, MergeOptions};
pub use document::Document;
pub use pipeline::{process, run, Processed, RunReport};

//! Pluggable geometry compression

use anyhow::Result;

use crate::document::Document;

pub const MAX_COMPRESSION_LEVEL: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Connectivity-aware, used whenever speed leaves room for it
    Edgebreaker,
    /// Plain per-vertex encoding at the fastest speed
    Sequential,
}

/// Encoder parameters derived from a single 0-10 level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub level: i32,
    pub method: CompressionMethod,
    pub encode_speed: i32,
    pub decode_speed: i32,
}

impl CompressionSettings {
    /// Levels outside 0-10 are clamped. Higher levels trade speed for size;
    /// level 0 runs at full speed with sequential encoding.
    pub fn from_level(level: i32) -> Self {
        let level = level.clamp(0, MAX_COMPRESSION_LEVEL);
        let speed = MAX_COMPRESSION_LEVEL - level;
        Self {
            level,
            method: if speed == MAX_COMPRESSION_LEVEL {
                CompressionMethod::Sequential
            } else {
                CompressionMethod::Edgebreaker
            },
            encode_speed: speed,
            decode_speed: speed,
        }
    }
}

/// Geometry encoder applied to the finished document
pub trait GeometryCodec {
    fn name(&self) -> &str;

    fn compress(&self, doc: &mut Document, settings: &CompressionSettings) -> Result<()>;
}

/// Run `codec` at `level`. Returns false when no codec is available.
pub fn compress_geometry(
    doc: &mut Document,
    codec: Option<&dyn GeometryCodec>,
    level: i32,
) -> Result<bool> {
    let settings = CompressionSettings::from_level(level);
    let Some(codec) = codec else {
        tracing::warn!(
            "Geometry compression level {} requested but no codec is available, skipping",
            settings.level
        );
        return Ok(false);
    };

    tracing::info!("Compressing geometry with {} (level {})", codec.name(), settings.level);
    codec.compress(doc, &settings)?;
    Ok(true)
}

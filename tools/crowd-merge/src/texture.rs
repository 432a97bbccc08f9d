//! Texture decode/encode, cleanup and resizing

use anyhow::{Context, Result};
use hashbrown::{HashMap, HashSet};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::atlas::AtlasError;
use crate::config::Lod;
use crate::document::{Document, Id, Texture, TextureChannel};

fn format_for(mime_type: &str) -> Result<ImageFormat, AtlasError> {
    match ImageFormat::from_mime_type(mime_type) {
        Some(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => Ok(format),
        _ => Err(AtlasError::UnsupportedMime(mime_type.to_string())),
    }
}

/// Decode an encoded image to RGBA8
pub fn decode(bytes: &[u8], mime_type: &str) -> Result<RgbaImage> {
    let format = format_for(mime_type)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("Failed to decode {} image", mime_type))?;
    Ok(image.to_rgba8())
}

/// Encode an RGBA8 raster. JPEG drops the alpha channel.
pub fn encode(raster: &RgbaImage, mime_type: &str) -> Result<Vec<u8>> {
    let format = format_for(mime_type)?;
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(raster.clone()).to_rgb8()),
        _ => DynamicImage::ImageRgba8(raster.clone()),
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .with_context(|| format!("Failed to encode {} image", mime_type))?;
    Ok(bytes)
}

/// Width and height without decoding pixel data
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("Failed to sniff image format")?
        .into_dimensions()
        .context("Failed to read image dimensions")
}

/// Texture kinds dropped at reduced detail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureCleanup {
    pub normal: bool,
    pub occlusion: bool,
    pub emissive: bool,
}

impl TextureCleanup {
    /// Normals above LOD 2, occlusion above LOD 1, emissive above LOD 0
    pub fn for_lod(lod: Lod) -> Self {
        let level = lod.level();
        Self {
            normal: level > 2,
            occlusion: level > 1,
            emissive: level > 0,
        }
    }

    fn removes(&self, channel: TextureChannel) -> bool {
        match channel {
            TextureChannel::Normal => self.normal,
            TextureChannel::Occlusion => self.occlusion,
            TextureChannel::Emissive => self.emissive,
            TextureChannel::BaseColor | TextureChannel::MetallicRoughness => false,
        }
    }
}

/// Dispose textures used by exactly one channel kind when that kind is
/// flagged. Textures shared between kinds stay. Returns the disposed count.
pub fn cleanup_textures(doc: &mut Document, cleanup: TextureCleanup) -> usize {
    let mut usage: HashMap<Id<Texture>, HashSet<TextureChannel>> = HashMap::new();
    for (_, material) in doc.materials.iter() {
        for channel in TextureChannel::ALL {
            if let Some(texture) = material.texture(channel) {
                usage.entry(texture).or_default().insert(channel);
            }
        }
    }

    let mut disposed = 0;
    for texture in doc.textures.ids().into_iter().rev() {
        let Some(channels) = usage.get(&texture) else {
            continue;
        };
        if channels.len() == 1 && channels.iter().all(|&c| cleanup.removes(c)) {
            doc.dispose_texture(texture);
            disposed += 1;
        }
    }

    if disposed > 0 {
        tracing::info!("Removed {} textures", disposed);
    }
    disposed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Resample to exactly `size × size`
    Exact,
    /// Downscale to fit within `size × size`, keeping aspect ratio
    FitWithin,
}

/// Resample every texture, re-encoding in its own format. Textures in an
/// unsupported format are left alone. Returns the resized count.
pub fn resize_textures(doc: &mut Document, size: u32, mode: ResizeMode) -> Result<usize> {
    let mut resized = 0;
    for (_, texture) in doc.textures.iter_mut() {
        if format_for(&texture.mime_type).is_err() {
            tracing::warn!(
                "Skipping resize of {:?}: unsupported type {}",
                texture.name,
                texture.mime_type
            );
            continue;
        }
        let raster = decode(&texture.image, &texture.mime_type)
            .with_context(|| format!("Failed to resize texture {:?}", texture.name))?;
        let (width, height) = raster.dimensions();

        let output = match mode {
            ResizeMode::Exact if (width, height) != (size, size) => {
                image::imageops::resize(&raster, size, size, FilterType::Triangle)
            }
            ResizeMode::FitWithin if width > size || height > size => {
                DynamicImage::ImageRgba8(raster)
                    .resize(size, size, FilterType::Lanczos3)
                    .to_rgba8()
            }
            _ => continue,
        };

        texture.image = encode(&output, &texture.mime_type)
            .with_context(|| format!("Failed to re-encode texture {:?}", texture.name))?;
        resized += 1;
    }
    Ok(resized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Material;
    use image::Rgba;

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode(&RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255])), "image/png").unwrap()
    }

    #[test]
    fn test_png_round_trip_and_dimensions() {
        let bytes = png(7, 3);
        assert_eq!(dimensions(&bytes).unwrap(), (7, 3));
        let raster = decode(&bytes, "image/png").unwrap();
        assert_eq!(raster.get_pixel(6, 2).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_jpeg_encodes_without_alpha() {
        let raster = RgbaImage::from_pixel(16, 16, Rgba([0, 255, 0, 255]));
        let bytes = encode(&raster, "image/jpeg").unwrap();
        let back = decode(&bytes, "image/jpeg").unwrap();
        assert_eq!(back.dimensions(), (16, 16));
        assert_eq!(back.get_pixel(8, 8).0[3], 255);
    }

    #[test]
    fn test_unsupported_mime() {
        let err = decode(&[], "image/webp").unwrap_err();
        assert_eq!(
            err.downcast_ref::<AtlasError>(),
            Some(&AtlasError::UnsupportedMime("image/webp".to_string()))
        );
    }

    #[test]
    fn test_cleanup_only_removes_single_kind_textures() {
        let mut doc = Document::new();
        let normal = doc.create_texture("normal", png(2, 2), "image/png");
        let shared = doc.create_texture("shared", png(2, 2), "image/png");
        let emissive = doc.create_texture("emissive", png(2, 2), "image/png");

        let mut a = Material::new("a");
        a.set_normal_texture(Some(normal));
        a.set_occlusion_texture(Some(shared));
        a.set_emissive_texture(Some(emissive));
        let a = doc.create_material(a);
        let mut b = Material::new("b");
        b.set_base_color_texture(Some(shared));
        doc.create_material(b);

        let removed = cleanup_textures(&mut doc, TextureCleanup::for_lod(Lod::new(3).unwrap()));

        assert_eq!(removed, 2);
        assert!(doc.textures.contains(shared));
        assert_eq!(doc.materials[a].normal_texture(), None);
        assert_eq!(doc.materials[a].emissive_texture(), None);
        assert_eq!(doc.materials[a].occlusion_texture(), Some(shared));
    }

    #[test]
    fn test_cleanup_flags_per_lod() {
        let flags = |level| TextureCleanup::for_lod(Lod::new(level).unwrap());
        assert_eq!(flags(0), TextureCleanup::default());
        assert_eq!(
            flags(2),
            TextureCleanup {
                normal: false,
                occlusion: true,
                emissive: true
            }
        );
    }

    #[test]
    fn test_resize_modes() {
        let mut doc = Document::new();
        let wide = doc.create_texture("wide", png(64, 32), "image/png");
        let small = doc.create_texture("small", png(8, 8), "image/png");

        let resized = resize_textures(&mut doc, 16, ResizeMode::FitWithin).unwrap();
        assert_eq!(resized, 1);
        assert_eq!(dimensions(&doc.textures[wide].image).unwrap(), (16, 8));
        assert_eq!(dimensions(&doc.textures[small].image).unwrap(), (8, 8));

        let resized = resize_textures(&mut doc, 32, ResizeMode::Exact).unwrap();
        assert_eq!(resized, 2);
        assert_eq!(dimensions(&doc.textures[wide].image).unwrap(), (32, 32));
        assert_eq!(dimensions(&doc.textures[small].image).unwrap(), (32, 32));
        let raster = decode(&doc.textures[small].image, "image/png").unwrap();
        assert_eq!(raster.get_pixel(16, 16).0, [200, 100, 50, 255]);
    }
}

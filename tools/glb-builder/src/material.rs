//! PBR material construction

use gltf_json as json;
use gltf_json::validation::Checked::Valid;

/// Builder for metallic-roughness materials
pub struct MaterialBuilder {
    material: json::Material,
}

fn texture_info(index: u32) -> json::texture::Info {
    json::texture::Info {
        index: json::Index::new(index),
        tex_coord: 0,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

impl MaterialBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            material: json::Material {
                name: Some(name.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn base_color_factor(mut self, factor: [f32; 4]) -> Self {
        self.material.pbr_metallic_roughness.base_color_factor =
            json::material::PbrBaseColorFactor(factor);
        self
    }

    pub fn metallic_factor(mut self, factor: f32) -> Self {
        self.material.pbr_metallic_roughness.metallic_factor =
            json::material::StrengthFactor(factor);
        self
    }

    pub fn roughness_factor(mut self, factor: f32) -> Self {
        self.material.pbr_metallic_roughness.roughness_factor =
            json::material::StrengthFactor(factor);
        self
    }

    pub fn emissive_factor(mut self, factor: [f32; 3]) -> Self {
        self.material.emissive_factor = json::material::EmissiveFactor(factor);
        self
    }

    pub fn base_color_texture(mut self, texture: u32) -> Self {
        self.material.pbr_metallic_roughness.base_color_texture = Some(texture_info(texture));
        self
    }

    pub fn metallic_roughness_texture(mut self, texture: u32) -> Self {
        self.material.pbr_metallic_roughness.metallic_roughness_texture =
            Some(texture_info(texture));
        self
    }

    pub fn normal_texture(mut self, texture: u32) -> Self {
        self.material.normal_texture = Some(json::material::NormalTexture {
            index: json::Index::new(texture),
            scale: 1.0,
            tex_coord: 0,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self
    }

    pub fn occlusion_texture(mut self, texture: u32) -> Self {
        self.material.occlusion_texture = Some(json::material::OcclusionTexture {
            index: json::Index::new(texture),
            strength: json::material::StrengthFactor(1.0),
            tex_coord: 0,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self
    }

    pub fn emissive_texture(mut self, texture: u32) -> Self {
        self.material.emissive_texture = Some(texture_info(texture));
        self
    }

    /// Alpha mode by glTF name ("OPAQUE", "MASK", "BLEND"); unknown names stay opaque
    pub fn alpha_mode(mut self, mode: &str) -> Self {
        self.material.alpha_mode = Valid(match mode {
            "MASK" => json::material::AlphaMode::Mask,
            "BLEND" => json::material::AlphaMode::Blend,
            _ => json::material::AlphaMode::Opaque,
        });
        self
    }

    pub fn alpha_cutoff(mut self, cutoff: Option<f32>) -> Self {
        self.material.alpha_cutoff = cutoff.map(json::material::AlphaCutoff);
        self
    }

    pub fn double_sided(mut self, double_sided: bool) -> Self {
        self.material.double_sided = double_sided;
        self
    }

    pub fn build(self) -> json::Material {
        self.material
    }
}

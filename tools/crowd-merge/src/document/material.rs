//! Materials and texture channel accessors

use super::{Id, Texture};

/// glTF alpha blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AlphaMode::Opaque => "OPAQUE",
            AlphaMode::Mask => "MASK",
            AlphaMode::Blend => "BLEND",
        }
    }
}

/// Metallic-roughness material
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
    base_color_texture: Option<Id<Texture>>,
    metallic_roughness_texture: Option<Id<Texture>>,
    normal_texture: Option<Id<Texture>>,
    occlusion_texture: Option<Id<Texture>>,
    emissive_texture: Option<Id<Texture>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color_factor: [1.0; 4],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: None,
            double_sided: false,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
        }
    }

    pub fn base_color_texture(&self) -> Option<Id<Texture>> {
        self.base_color_texture
    }

    pub fn set_base_color_texture(&mut self, texture: Option<Id<Texture>>) {
        self.base_color_texture = texture;
    }

    pub fn metallic_roughness_texture(&self) -> Option<Id<Texture>> {
        self.metallic_roughness_texture
    }

    pub fn set_metallic_roughness_texture(&mut self, texture: Option<Id<Texture>>) {
        self.metallic_roughness_texture = texture;
    }

    pub fn normal_texture(&self) -> Option<Id<Texture>> {
        self.normal_texture
    }

    pub fn set_normal_texture(&mut self, texture: Option<Id<Texture>>) {
        self.normal_texture = texture;
    }

    pub fn occlusion_texture(&self) -> Option<Id<Texture>> {
        self.occlusion_texture
    }

    pub fn set_occlusion_texture(&mut self, texture: Option<Id<Texture>>) {
        self.occlusion_texture = texture;
    }

    pub fn emissive_texture(&self) -> Option<Id<Texture>> {
        self.emissive_texture
    }

    pub fn set_emissive_texture(&mut self, texture: Option<Id<Texture>>) {
        self.emissive_texture = texture;
    }

    /// Texture bound to `channel`
    pub fn texture(&self, channel: TextureChannel) -> Option<Id<Texture>> {
        (channel.accessors().get)(self)
    }

    /// Bind (or clear) the texture of `channel`
    pub fn set_texture(&mut self, channel: TextureChannel, texture: Option<Id<Texture>>) {
        (channel.accessors().set)(self, texture)
    }
}

/// Material texture inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureChannel {
    BaseColor,
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
}

/// Getter/setter pair for one channel
pub struct ChannelAccessors {
    pub get: fn(&Material) -> Option<Id<Texture>>,
    pub set: fn(&mut Material, Option<Id<Texture>>),
}

/// Indexed by `TextureChannel as usize`
static CHANNEL_ACCESSORS: [ChannelAccessors; 5] = [
    ChannelAccessors {
        get: Material::base_color_texture,
        set: Material::set_base_color_texture,
    },
    ChannelAccessors {
        get: Material::metallic_roughness_texture,
        set: Material::set_metallic_roughness_texture,
    },
    ChannelAccessors {
        get: Material::normal_texture,
        set: Material::set_normal_texture,
    },
    ChannelAccessors {
        get: Material::occlusion_texture,
        set: Material::set_occlusion_texture,
    },
    ChannelAccessors {
        get: Material::emissive_texture,
        set: Material::set_emissive_texture,
    },
];

impl TextureChannel {
    pub const ALL: [TextureChannel; 5] = [
        TextureChannel::BaseColor,
        TextureChannel::MetallicRoughness,
        TextureChannel::Normal,
        TextureChannel::Occlusion,
        TextureChannel::Emissive,
    ];

    pub fn accessors(self) -> &'static ChannelAccessors {
        &CHANNEL_ACCESSORS[self as usize]
    }
}

//! Run options and level-of-detail tables
//!
//! Options come from CLI flags or from a TOML job file:
//!
//! ```toml
//! files = ["body.glb", "hair.glb", "top.glb"]
//! output = "crowd.glb"
//! lod = 1
//! merge = true
//! draco = 7
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Atlas edge length per detail level
pub const ATLAS_RESOLUTIONS: [u32; 4] = [2048, 512, 256, 64];

/// Simplification error threshold per detail level
pub const SIMPLIFY_ERRORS: [f32; 4] = [0.001, 0.002, 0.005, 0.015];

/// Explicit resize targets equal to this are ignored
pub const NATIVE_TEXTURE_SIZE: u32 = 1024;

/// Texture size used when nothing else selects one
pub const DEFAULT_TEXTURE_SIZE: u32 = 512;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid LOD {0} (must be 0-3)")]
    InvalidLod(u8),

    #[error("invalid resize target {0} (must be greater than zero)")]
    InvalidResize(u32),

    #[error("no input files given")]
    NoInputs,
}

/// Level of detail, 0 (full) to 3 (coarsest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(try_from = "u8")]
pub struct Lod(u8);

impl Lod {
    pub const MAX: u8 = 3;

    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if level > Self::MAX {
            return Err(ConfigError::InvalidLod(level));
        }
        Ok(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn atlas_resolution(self) -> u32 {
        ATLAS_RESOLUTIONS[self.0 as usize]
    }

    pub fn simplify_error(self) -> f32 {
        SIMPLIFY_ERRORS[self.0 as usize]
    }
}

impl TryFrom<u8> for Lod {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Lod::new(level)
    }
}

/// Encoding of the atlas images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AtlasFormat {
    Png,
    #[default]
    Jpeg,
}

impl AtlasFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AtlasFormat::Png => "image/png",
            AtlasFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Everything a merge run needs
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeOptions {
    /// Input GLB files, in merge order
    pub files: Vec<PathBuf>,

    /// Output GLB path
    pub output: PathBuf,

    #[serde(default)]
    pub lod: Lod,

    /// Consolidate skins, meshes and textures into atlases
    #[serde(default)]
    pub merge: bool,

    /// Texture size outside merge mode
    #[serde(default)]
    pub resize: Option<u32>,

    /// Geometry compression level 0-10 (clamped)
    #[serde(default)]
    pub draco: Option<i32>,

    /// Print the inspection dump as JSON
    #[serde(default)]
    pub inspect: bool,

    #[serde(default)]
    pub atlas_format: AtlasFormat,
}

impl MergeOptions {
    pub fn new(files: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            files,
            output: output.into(),
            lod: Lod::default(),
            merge: false,
            resize: None,
            draco: None,
            inspect: false,
            atlas_format: AtlasFormat::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.files.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        if self.resize == Some(0) {
            return Err(ConfigError::InvalidResize(0));
        }
        Ok(())
    }

    /// Texture size before atlas layout is known
    pub fn initial_texture_size(&self) -> u32 {
        match self.resize {
            Some(size) if !self.merge => size,
            _ => DEFAULT_TEXTURE_SIZE,
        }
    }

    /// Whether textures get resized to `texture_size`
    pub fn should_resize(&self, texture_size: u32) -> bool {
        self.merge || (self.resize.is_some() && texture_size != NATIVE_TEXTURE_SIZE)
    }

    /// Short description of the active passes
    pub fn describe(&self) -> Vec<String> {
        let mut params = Vec::new();
        if self.merge {
            params.push("Merging".to_string());
        }
        if self.merge || self.resize.is_some() {
            params.push("Resizing".to_string());
        }
        if self.lod.level() > 0 {
            params.push(format!("LoD {}", self.lod.level()));
        }
        params
    }
}

/// Load a TOML job file. Relative paths resolve against the file's directory.
pub fn load_job(path: &Path) -> Result<MergeOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file: {:?}", path))?;
    let mut options: MergeOptions = toml::from_str(&content)
        .with_context(|| format!("Failed to parse job file: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for file in options.files.iter_mut() {
        if file.is_relative() {
            *file = base.join(&*file);
        }
    }
    if options.output.is_relative() {
        options.output = base.join(&options.output);
    }

    options.validate()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_tables() {
        let expected = [(2048, 0.001), (512, 0.002), (256, 0.005), (64, 0.015)];
        for (level, (resolution, error)) in expected.into_iter().enumerate() {
            let lod = Lod::new(level as u8).unwrap();
            assert_eq!(lod.atlas_resolution(), resolution);
            assert_eq!(lod.simplify_error(), error);
        }
        assert_eq!(Lod::new(4), Err(ConfigError::InvalidLod(4)));
    }

    #[test]
    fn test_texture_size_selection() {
        let mut options = MergeOptions::new(vec!["a.glb".into()], "out.glb");
        assert_eq!(options.initial_texture_size(), DEFAULT_TEXTURE_SIZE);
        assert!(!options.should_resize(options.initial_texture_size()));

        options.resize = Some(256);
        assert_eq!(options.initial_texture_size(), 256);
        assert!(options.should_resize(256));

        options.resize = Some(NATIVE_TEXTURE_SIZE);
        assert!(!options.should_resize(NATIVE_TEXTURE_SIZE));

        options.merge = true;
        assert_eq!(options.initial_texture_size(), DEFAULT_TEXTURE_SIZE);
        assert!(options.should_resize(NATIVE_TEXTURE_SIZE));
    }

    #[test]
    fn test_validate() {
        let options = MergeOptions::new(Vec::new(), "out.glb");
        assert_eq!(options.validate(), Err(ConfigError::NoInputs));

        let mut options = MergeOptions::new(vec!["a.glb".into()], "out.glb");
        options.resize = Some(0);
        assert_eq!(options.validate(), Err(ConfigError::InvalidResize(0)));
    }

    #[test]
    fn test_load_job_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.toml");
        std::fs::write(
            &job,
            r#"
files = ["a.glb", "b.glb"]
output = "out/crowd.glb"
lod = 2
merge = true
atlas_format = "png"
"#,
        )
        .unwrap();

        let options = load_job(&job).unwrap();
        assert_eq!(options.files, vec![dir.path().join("a.glb"), dir.path().join("b.glb")]);
        assert_eq!(options.output, dir.path().join("out/crowd.glb"));
        assert_eq!(options.lod.level(), 2);
        assert!(options.merge);
        assert_eq!(options.atlas_format, AtlasFormat::Png);
        assert_eq!(options.draco, None);
    }

    #[test]
    fn test_load_job_rejects_bad_lod() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.toml");
        std::fs::write(&job, "files = [\"a.glb\"]\noutput = \"o.glb\"\nlod = 7\n").unwrap();
        assert!(load_job(&job).is_err());
    }
}

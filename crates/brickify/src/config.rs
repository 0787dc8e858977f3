//! Conversion settings
//!
//! Settings come from builder calls or from a TOML file whose keys mirror the
//! struct fields; missing keys keep their defaults.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::ColorCatalog;
use crate::layers::DEFAULT_MAX_LAYERS;
use crate::ldraw::{LDrawHeader, DEFAULT_COLOR_CODE};
use crate::packer::{BrickShape, ShapeCatalog, DEFAULT_SHAPES};
use crate::types::{BrickifyError, Result};

/// Largest accepted resolution
pub const MAX_RESOLUTION: u32 = 1024;

fn default_resolution() -> u32 {
    64
}

fn default_pitch() -> f32 {
    1.0
}

fn default_max_layers() -> u32 {
    DEFAULT_MAX_LAYERS
}

fn default_true() -> bool {
    true
}

fn default_color() -> u32 {
    DEFAULT_COLOR_CODE
}

fn default_shapes() -> Vec<BrickShape> {
    DEFAULT_SHAPES.to_vec()
}

/// Settings for one mesh to brick conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Target box edge in grid cells; the box is resolution × resolution × resolution/2
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Voxel edge length in target-box units
    #[serde(default = "default_pitch")]
    pub pitch: f32,

    /// Maximum number of levels turned into layers
    #[serde(default = "default_max_layers")]
    pub max_layers: u32,

    /// Fill enclosed voids in each horizontal slice
    #[serde(default = "default_true")]
    pub fill_interior: bool,

    /// Assign catalog colors from mesh vertex colors
    #[serde(default = "default_true")]
    pub assign_colors: bool,

    /// Color code for uncolored placements
    #[serde(default = "default_color")]
    pub default_color: u32,

    /// Brick footprints as (height, width) in cells
    #[serde(default = "default_shapes")]
    pub shapes: Vec<BrickShape>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Color catalog file (`.toml` or LDConfig `.ldr`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    #[serde(skip)]
    pub catalog: ColorCatalog,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            pitch: default_pitch(),
            max_layers: default_max_layers(),
            fill_interior: true,
            assign_colors: true,
            default_color: default_color(),
            shapes: default_shapes(),
            model_name: None,
            author: None,
            catalog_path: None,
            catalog: ColorCatalog::default(),
        }
    }
}

impl ConvertConfig {
    /// Create a config with the given resolution
    pub fn new(resolution: u32) -> Self {
        Self::default().with_resolution(resolution)
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution.clamp(1, MAX_RESOLUTION);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_max_layers(mut self, max_layers: u32) -> Self {
        self.max_layers = max_layers.max(1);
        self
    }

    pub fn with_fill_interior(mut self, fill: bool) -> Self {
        self.fill_interior = fill;
        self
    }

    pub fn with_assign_colors(mut self, assign: bool) -> Self {
        self.assign_colors = assign;
        self
    }

    pub fn with_default_color(mut self, code: u32) -> Self {
        self.default_color = code;
        self
    }

    pub fn with_shapes(mut self, shapes: Vec<BrickShape>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    pub fn with_catalog(mut self, catalog: ColorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Target box dimensions (width, depth, height)
    pub fn target_dims(&self) -> Vec3 {
        let r = self.resolution as f32;
        Vec3::new(r, r, r / 2.0)
    }

    /// Validated shape catalog
    pub fn shape_catalog(&self) -> Result<ShapeCatalog> {
        ShapeCatalog::new(self.shapes.clone())
    }

    /// Header for standalone model files
    pub fn header(&self) -> LDrawHeader {
        let mut header = LDrawHeader::default();
        if let Some(name) = &self.model_name {
            header.name = name.clone();
        }
        if let Some(author) = &self.author {
            header.author = author.clone();
        }
        header
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(BrickifyError::InvalidConfig(format!(
                "Resolution must be in 1..={}, got {}",
                MAX_RESOLUTION, self.resolution
            )));
        }
        if !(self.pitch > 0.0 && self.pitch.is_finite()) {
            return Err(BrickifyError::InvalidConfig(format!(
                "Pitch must be positive, got {}",
                self.pitch
            )));
        }
        let grid_edge = self.resolution as f32 / self.pitch;
        if grid_edge > MAX_RESOLUTION as f32 {
            return Err(BrickifyError::InvalidConfig(format!(
                "Pitch {} gives a grid edge of {:.0} cells at resolution {}, limit is {}",
                self.pitch, grid_edge, self.resolution, MAX_RESOLUTION
            )));
        }
        if self.max_layers == 0 {
            return Err(BrickifyError::InvalidConfig(
                "max_layers must be at least 1".to_string(),
            ));
        }
        self.shape_catalog()?;
        Ok(())
    }

    /// Parse a TOML config; the catalog is not loaded
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| BrickifyError::InvalidConfig(format!("Invalid config TOML: {}", e)))
    }

    /// Load a TOML config file and the catalog it points to
    ///
    /// A relative `catalog_path` is resolved against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BrickifyError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(catalog_path) = config.catalog_path.take() {
            let resolved = match path.parent() {
                Some(dir) if catalog_path.is_relative() => dir.join(&catalog_path),
                _ => catalog_path,
            };
            config = config.load_catalog(resolved)?;
        }

        tracing::debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Replace the color catalog with one read from disk
    pub fn load_catalog(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        self.catalog = ColorCatalog::load(&path)?;
        self.catalog_path = Some(path);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.resolution, 64);
        assert_eq!(config.pitch, 1.0);
        assert_eq!(config.max_layers, 30);
        assert!(config.fill_interior);
        assert!(config.assign_colors);
        assert_eq!(config.default_color, 14);
        assert_eq!(config.shapes.len(), 5);
        assert_eq!(config.catalog.len(), 16);
        assert_eq!(config.target_dims(), Vec3::new(64.0, 64.0, 32.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps() {
        let config = ConvertConfig::new(0).with_max_layers(0);
        assert_eq!(config.resolution, 1);
        assert_eq!(config.max_layers, 1);
        assert_eq!(ConvertConfig::new(100_000).resolution, MAX_RESOLUTION);
    }

    #[test]
    fn test_validate_rejects_bad_pitch_and_shapes() {
        assert!(ConvertConfig::default().with_pitch(0.0).validate().is_err());
        assert!(ConvertConfig::default().with_pitch(-1.0).validate().is_err());
        assert!(ConvertConfig::default()
            .with_shapes(vec![BrickShape::new(2, 0)])
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_caps_grid_size() {
        let err = ConvertConfig::default().with_pitch(0.001).validate().unwrap_err();
        assert!(matches!(err, BrickifyError::InvalidConfig(_)));
        assert!(ConvertConfig::new(MAX_RESOLUTION).validate().is_ok());
        assert!(ConvertConfig::new(64).with_pitch(0.5).validate().is_ok());
        assert!(ConvertConfig::new(MAX_RESOLUTION)
            .with_pitch(0.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ConvertConfig::from_toml_str(
            r#"
            resolution = 32
            fill_interior = false
            model_name = "castle"
            shapes = [{ height = 2, width = 2 }, { height = 1, width = 1 }]
            "#,
        )
        .unwrap();
        assert_eq!(config.resolution, 32);
        assert!(!config.fill_interior);
        assert!(config.assign_colors);
        assert_eq!(config.max_layers, 30);
        assert_eq!(config.shapes, vec![BrickShape::new(2, 2), BrickShape::new(1, 1)]);
        assert_eq!(config.header().name, "castle");
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(matches!(
            ConvertConfig::from_toml_str("resolution = \"high\""),
            Err(BrickifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_load_resolves_catalog_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = std::fs::File::create(dir.path().join("colors.toml")).unwrap();
        writeln!(catalog, "[[color]]\ncode = 4\nhex = \"#FF0000\"").unwrap();

        let config_path = dir.path().join("brickify.toml");
        std::fs::write(&config_path, "catalog_path = \"colors.toml\"\n").unwrap();

        let config = ConvertConfig::load(&config_path).unwrap();
        assert_eq!(config.catalog.len(), 1);
        assert_eq!(config.catalog.colors()[0].code, 4);
        assert_eq!(config.catalog_path, Some(dir.path().join("colors.toml")));
    }

    #[test]
    fn test_load_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("brickify.toml");
        std::fs::write(&config_path, "catalog_path = \"missing.toml\"\n").unwrap();
        assert!(matches!(
            ConvertConfig::load(&config_path),
            Err(BrickifyError::Catalog(_))
        ));
    }
}

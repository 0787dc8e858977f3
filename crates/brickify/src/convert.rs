//! End-to-end mesh to brick conversion
//!
//! Stages run in order: normalize, voxelize, repair, fill, slice. Repair
//! finishes before any per-layer work starts. Layers are then packed and
//! colored in parallel and merged back in level order.

use std::io::Write;
use std::path::Path;

use rayon::prelude::*;

use crate::color::{assign_layer_colors, VertexColorIndex};
use crate::config::ConvertConfig;
use crate::fill::fill_interior;
use crate::layers::slice_layers;
use crate::ldraw::{brick_plan, LDrawDocument};
use crate::mesh_io::load_mesh;
use crate::normalize::normalize_mesh;
use crate::packer::pack_layer;
use crate::repair::repair_connectivity;
use crate::types::{BrickLayer, BrickifyError, Mesh, Result};
use crate::voxel::voxelize;

/// Output file flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// LDraw model file
    #[default]
    Ldr,
    /// Plain-text per-layer brick report
    Plan,
}

/// Counts gathered while converting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub surface_voxels: usize,
    pub components: usize,
    pub bridge_voxels: usize,
    pub filled_voxels: usize,
    pub layers: usize,
    pub bricks: usize,
    pub colored: bool,
}

/// Result of a conversion
#[derive(Debug, Clone)]
pub struct Conversion {
    pub layers: Vec<BrickLayer>,
    pub document: LDrawDocument,
    pub stats: ConversionStats,
}

impl Conversion {
    /// Render the conversion in the requested format
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Ldr => self.document.to_ldr_string(),
            OutputFormat::Plan => brick_plan(&self.layers),
        }
    }
}

/// Convert an in-memory mesh to brick layers and an LDraw document
pub fn convert_mesh(mesh: &Mesh, config: &ConvertConfig) -> Result<Conversion> {
    config.validate()?;
    let shapes = config.shape_catalog()?;
    mesh.validate()?;

    let normalized = normalize_mesh(mesh, config.target_dims())?;
    let grid = voxelize(&normalized, config.pitch)?;
    let mut stats = ConversionStats {
        surface_voxels: grid.occupied_count(),
        ..Default::default()
    };

    let repaired = repair_connectivity(grid);
    stats.components = repaired.components;
    stats.bridge_voxels = repaired.bridge_voxels;

    let grid = if config.fill_interior {
        let filled = fill_interior(repaired.grid);
        stats.filled_voxels = filled.filled;
        filled.grid
    } else {
        repaired.grid
    };

    if grid.is_empty() {
        tracing::warn!("Voxel grid is empty, emitting header-only document");
    }

    let masks = slice_layers(&grid, config.max_layers);
    let frame = grid.frame();

    let color_index = if config.assign_colors {
        let index = VertexColorIndex::new(&normalized);
        if index.is_none() {
            tracing::info!("Mesh has no vertex colors, using default color");
        }
        index
    } else {
        None
    };
    stats.colored = color_index.is_some();

    let layers: Vec<BrickLayer> = masks
        .par_iter()
        .map(|mask| {
            let mut layer = BrickLayer {
                level: mask.level,
                row_offset: mask.row_offset,
                col_offset: mask.col_offset,
                placements: pack_layer(mask, &shapes),
            };
            if let Some(index) = &color_index {
                assign_layer_colors(&mut layer, frame, index, &config.catalog);
            }
            layer
        })
        .collect();

    stats.layers = layers.len();
    stats.bricks = layers.iter().map(BrickLayer::brick_count).sum();

    let document =
        LDrawDocument::from_layers(&layers, config.default_color).with_header(config.header());

    tracing::info!(
        layers = stats.layers,
        bricks = stats.bricks,
        colored = stats.colored,
        "Converted mesh to bricks"
    );

    Ok(Conversion {
        layers,
        document,
        stats,
    })
}

/// Load `input`, convert it and write the result to `output`
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConvertConfig,
    format: OutputFormat,
) -> Result<Conversion> {
    let mesh = load_mesh(input)?;
    let conversion = convert_mesh(&mesh, config)?;
    write_atomic(output.as_ref(), &conversion.render(format))?;
    Ok(conversion)
}

/// Write `contents` through a temp file in the target directory
///
/// The temp file is renamed over `path` only after a complete write and is
/// removed on any failure, so `path` is never left half written.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let output_error = |source: std::io::Error| BrickifyError::Output {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(output_error)?;
    file.write_all(contents.as_bytes()).map_err(output_error)?;
    file.as_file().sync_all().map_err(output_error)?;
    file.persist(path).map_err(|e| output_error(e.error))?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "Wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ldr");
        write_atomic(&path, "0 test\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 test\n");

        write_atomic(&path, "0 replaced\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 replaced\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("model.ldr");
        let err = write_atomic(&path, "0 test\n").unwrap_err();
        assert!(matches!(err, BrickifyError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_render_formats() {
        let conversion = Conversion {
            layers: Vec::new(),
            document: LDrawDocument::from_layers(&[], 14),
            stats: ConversionStats::default(),
        };
        assert!(conversion.render(OutputFormat::Ldr).starts_with("0 "));
        assert!(conversion.render(OutputFormat::Plan).is_empty());
    }
}

//! Core types shared by every pipeline stage

use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Brickify error types
#[derive(Debug, Error)]
pub enum BrickifyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mesh load error: {0}")]
    MeshLoad(String),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Degenerate mesh: zero extent along {axis} axis")]
    DegenerateMesh { axis: char },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for brickify operations that may fail
pub type Result<T> = std::result::Result<T, BrickifyError>;

/// Triangle soup with optional per-vertex colors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions as [x, y, z]
    pub vertices: Vec<[f32; 3]>,

    /// Triangle faces as vertex indices [v0, v1, v2]
    pub faces: Vec<[u32; 3]>,

    /// Per-vertex RGB colors in 0..=1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_colors: Option<Vec<[f32; 3]>>,
}

impl Mesh {
    /// Create a mesh without colors
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            vertex_colors: None,
        }
    }

    /// Attach per-vertex colors, normalizing 0-255 input to 0-1
    pub fn with_vertex_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.vertex_colors = Some(normalize_color_range(colors));
        self
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has vertex colors
    pub fn has_vertex_colors(&self) -> bool {
        self.vertex_colors
            .as_ref()
            .is_some_and(|colors| !colors.is_empty())
    }

    /// Axis-aligned bounds of the vertex positions, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from_array(*v));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
    }

    /// Validate mesh data
    ///
    /// Checks that every face index is in range, every coordinate is finite
    /// and the color count matches the vertex count.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices.len();

        if let Some(v) = self.vertices.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(BrickifyError::InvalidMesh(format!(
                "Vertex {} has a non-finite coordinate",
                v
            )));
        }

        for (i, face) in self.faces.iter().enumerate() {
            for &idx in face {
                if idx as usize >= vertex_count {
                    return Err(BrickifyError::InvalidMesh(format!(
                        "Face {} has invalid vertex index {} (max: {})",
                        i,
                        idx,
                        vertex_count.saturating_sub(1)
                    )));
                }
            }
        }

        if let Some(colors) = &self.vertex_colors {
            if colors.len() != vertex_count {
                return Err(BrickifyError::InvalidMesh(format!(
                    "Vertex color count ({}) doesn't match vertex count ({})",
                    colors.len(),
                    vertex_count
                )));
            }
        }

        Ok(())
    }

    /// Return a copy with every position mapped through `f`, colors and faces kept
    pub(crate) fn map_positions(&self, f: impl Fn(Vec3) -> Vec3) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| f(Vec3::from_array(*v)).to_array())
                .collect(),
            faces: self.faces.clone(),
            vertex_colors: self.vertex_colors.clone(),
        }
    }
}

/// Divide all colors by 255 when any component is above 1.0
pub fn normalize_color_range(mut colors: Vec<[f32; 3]>) -> Vec<[f32; 3]> {
    let needs_scaling = colors.iter().flatten().any(|&c| c > 1.0);
    if needs_scaling {
        for color in &mut colors {
            for c in color.iter_mut() {
                *c /= 255.0;
            }
        }
    }
    colors
}

/// A rectangular brick footprint placed in one layer
///
/// `row`/`col` are local to the layer mask; `height` counts rows and
/// `width` counts columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrickPlacement {
    pub row: u32,
    pub col: u32,
    pub height: u32,
    pub width: u32,
    pub color: Option<u32>,
}

impl BrickPlacement {
    pub fn new(row: u32, col: u32, height: u32, width: u32) -> Self {
        Self {
            row,
            col,
            height,
            width,
            color: None,
        }
    }

    /// Number of cells covered
    pub fn area(&self) -> u32 {
        self.height * self.width
    }

    /// Check whether local cell (row, col) lies inside this placement
    pub fn covers(&self, row: u32, col: u32) -> bool {
        row >= self.row
            && row < self.row + self.height
            && col >= self.col
            && col < self.col + self.width
    }
}

/// Placements for one vertical level together with the layer offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickLayer {
    pub level: u32,
    pub row_offset: u32,
    pub col_offset: u32,
    pub placements: Vec<BrickPlacement>,
}

impl BrickLayer {
    pub fn brick_count(&self) -> usize {
        self.placements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(triangle().validate().is_ok());
    }

    #[test]
    fn test_validate_index_out_of_range() {
        let mut mesh = triangle();
        mesh.faces.push([0, 1, 3]);
        let err = mesh.validate().unwrap_err();
        assert!(matches!(err, BrickifyError::InvalidMesh(_)));
        assert!(err.to_string().contains("invalid vertex index 3"));
    }

    #[test]
    fn test_validate_color_count_mismatch() {
        let mesh = triangle().with_vertex_colors(vec![[1.0, 0.0, 0.0]]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_non_finite() {
        let mut mesh = triangle();
        mesh.vertices[1][2] = f32::NAN;
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_color_range_normalized() {
        let mesh = triangle().with_vertex_colors(vec![
            [255.0, 0.0, 0.0],
            [0.0, 127.5, 0.0],
            [0.0, 0.0, 0.0],
        ]);
        let colors = mesh.vertex_colors.unwrap();
        assert_eq!(colors[0], [1.0, 0.0, 0.0]);
        assert!((colors[1][1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unit_colors_untouched() {
        let colors = normalize_color_range(vec![[0.2, 0.4, 1.0]]);
        assert_eq!(colors, vec![[0.2, 0.4, 1.0]]);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = triangle().bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(Mesh::default().bounds().is_none());
    }

    #[test]
    fn test_placement_covers() {
        let p = BrickPlacement::new(1, 2, 2, 4);
        assert_eq!(p.area(), 8);
        assert!(p.covers(1, 2));
        assert!(p.covers(2, 5));
        assert!(!p.covers(3, 2));
        assert!(!p.covers(1, 6));
    }
}

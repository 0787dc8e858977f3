//! Greedy rectangle covering of layer masks
//!
//! Shapes are tried largest first. Each shape sweeps the mask row by row and
//! is placed wherever its whole footprint is occupied and still unassigned.
//! Cells left over after every shape has been tried become 1×1 bricks, so the
//! cover is always complete and non-overlapping, though not minimal.

use serde::{Deserialize, Serialize};

use crate::layers::LayerMask;
use crate::types::{BrickPlacement, BrickifyError, Result};

/// Rectangular brick footprint in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrickShape {
    /// Rows covered
    pub height: u32,
    /// Columns covered
    pub width: u32,
}

impl BrickShape {
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    pub fn area(&self) -> u32 {
        self.height * self.width
    }
}

impl std::fmt::Display for BrickShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Default footprints as (rows, cols)
pub const DEFAULT_SHAPES: [BrickShape; 5] = [
    BrickShape::new(2, 4),
    BrickShape::new(4, 2),
    BrickShape::new(2, 1),
    BrickShape::new(1, 2),
    BrickShape::new(1, 1),
];

/// Longest accepted shape side, in cells
pub const MAX_SHAPE_SIDE: u32 = 1024;

/// Shapes ordered by descending area, equal areas keep their given order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeCatalog {
    shapes: Vec<BrickShape>,
}

impl ShapeCatalog {
    /// Create a catalog, rejecting zero-sized and oversized shapes
    pub fn new(mut shapes: Vec<BrickShape>) -> Result<Self> {
        if let Some(shape) = shapes.iter().find(|s| s.height == 0 || s.width == 0) {
            return Err(BrickifyError::InvalidConfig(format!(
                "Brick shape {} has zero size",
                shape
            )));
        }
        if let Some(shape) = shapes
            .iter()
            .find(|s| s.height > MAX_SHAPE_SIDE || s.width > MAX_SHAPE_SIDE)
        {
            return Err(BrickifyError::InvalidConfig(format!(
                "Brick shape {} exceeds the {} cell side limit",
                shape, MAX_SHAPE_SIDE
            )));
        }
        shapes.sort_by_key(|s| std::cmp::Reverse(s.area()));
        Ok(Self { shapes })
    }

    pub fn shapes(&self) -> &[BrickShape] {
        &self.shapes
    }
}

impl Default for ShapeCatalog {
    fn default() -> Self {
        Self {
            shapes: DEFAULT_SHAPES.to_vec(),
        }
    }
}

/// Cover every occupied cell of `mask` with non-overlapping placements
pub fn pack_layer(mask: &LayerMask, catalog: &ShapeCatalog) -> Vec<BrickPlacement> {
    let (rows, cols) = (mask.rows(), mask.cols());
    let mut assigned = vec![false; rows as usize * cols as usize];
    let slot = |row: u32, col: u32| (row * cols + col) as usize;
    let mut placements = Vec::new();

    let fits = |row: u32, col: u32, shape: BrickShape, assigned: &[bool]| {
        if row + shape.height > rows || col + shape.width > cols {
            return false;
        }
        (row..row + shape.height).all(|r| {
            (col..col + shape.width).all(|c| !assigned[slot(r, c)] && mask.get(r, c))
        })
    };

    for &shape in catalog.shapes() {
        for row in 0..rows {
            for col in 0..cols {
                if !fits(row, col, shape, &assigned) {
                    continue;
                }
                for r in row..row + shape.height {
                    for c in col..col + shape.width {
                        assigned[slot(r, c)] = true;
                    }
                }
                placements.push(BrickPlacement::new(row, col, shape.height, shape.width));
            }
        }
    }

    let mut leftovers = 0;
    for row in 0..rows {
        for col in 0..cols {
            if mask.get(row, col) && !assigned[slot(row, col)] {
                assigned[slot(row, col)] = true;
                placements.push(BrickPlacement::new(row, col, 1, 1));
                leftovers += 1;
            }
        }
    }

    tracing::debug!(
        level = mask.level,
        bricks = placements.len(),
        leftovers,
        "Packed layer"
    );
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(mask: &LayerMask, placements: &[BrickPlacement]) -> Vec<u32> {
        let mut counts = vec![0u32; (mask.rows() * mask.cols()) as usize];
        for p in placements {
            for r in p.row..p.row + p.height {
                for c in p.col..p.col + p.width {
                    counts[(r * mask.cols() + c) as usize] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn test_catalog_sorted_stable() {
        let catalog = ShapeCatalog::new(vec![
            BrickShape::new(1, 1),
            BrickShape::new(1, 2),
            BrickShape::new(2, 1),
            BrickShape::new(2, 4),
            BrickShape::new(4, 2),
        ])
        .unwrap();
        assert_eq!(
            catalog.shapes(),
            &[
                BrickShape::new(2, 4),
                BrickShape::new(4, 2),
                BrickShape::new(1, 2),
                BrickShape::new(2, 1),
                BrickShape::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_zero_shape_rejected() {
        assert!(ShapeCatalog::new(vec![BrickShape::new(0, 2)]).is_err());
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let result = ShapeCatalog::new(vec![BrickShape::new(u32::MAX, 1)]);
        assert!(matches!(result, Err(BrickifyError::InvalidConfig(_))));
        assert!(ShapeCatalog::new(vec![BrickShape::new(MAX_SHAPE_SIDE, 1)]).is_ok());
    }

    #[test]
    fn test_single_cell() {
        let mask = LayerMask::from_rows(0, &["#"]).unwrap();
        let placements = pack_layer(&mask, &ShapeCatalog::default());
        assert_eq!(placements, vec![BrickPlacement::new(0, 0, 1, 1)]);
    }

    #[test]
    fn test_full_two_by_four() {
        let mask = LayerMask::from_rows(0, &["####", "####"]).unwrap();
        let placements = pack_layer(&mask, &ShapeCatalog::default());
        assert_eq!(placements, vec![BrickPlacement::new(0, 0, 2, 4)]);
    }

    #[test]
    fn test_four_by_two_uses_rotated_shape() {
        let mask = LayerMask::from_rows(0, &["##", "##", "##", "##"]).unwrap();
        let placements = pack_layer(&mask, &ShapeCatalog::default());
        assert_eq!(placements, vec![BrickPlacement::new(0, 0, 4, 2)]);
    }

    #[test]
    fn test_irregular_mask_exact_cover() {
        let mask = LayerMask::from_rows(
            3,
            &["#####.", "######", "..####", "#.##.#", "######"],
        )
        .unwrap();
        let placements = pack_layer(&mask, &ShapeCatalog::default());
        let counts = coverage(&mask, &placements);

        for row in 0..mask.rows() {
            for col in 0..mask.cols() {
                let expected = u32::from(mask.get(row, col));
                assert_eq!(counts[(row * mask.cols() + col) as usize], expected);
            }
        }
    }

    #[test]
    fn test_empty_catalog_falls_back_to_unit_bricks() {
        let mask = LayerMask::from_rows(0, &["##", "#."]).unwrap();
        let catalog = ShapeCatalog::new(Vec::new()).unwrap();
        let placements = pack_layer(&mask, &catalog);
        assert_eq!(placements.len(), 3);
        assert!(placements.iter().all(|p| p.area() == 1));
    }
}

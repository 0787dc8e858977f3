//! Per-level 2D masks cropped to their bounding box
//!
//! Rows follow grid X, columns follow grid Y, levels follow grid Z.

use glam::IVec3;

use crate::voxel::VoxelGrid;

/// Default cap on the number of levels turned into layers
pub const DEFAULT_MAX_LAYERS: u32 = 30;

/// Occupancy of one vertical level cropped to its bounding box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMask {
    pub level: u32,
    pub row_offset: u32,
    pub col_offset: u32,
    rows: u32,
    cols: u32,
    cells: Vec<bool>,
}

impl LayerMask {
    /// Build a mask from row-major cells
    ///
    /// Returns `None` when `cells.len() != rows * cols`.
    pub fn new(
        level: u32,
        row_offset: u32,
        col_offset: u32,
        rows: u32,
        cols: u32,
        cells: Vec<bool>,
    ) -> Option<Self> {
        (cells.len() == rows as usize * cols as usize).then_some(Self {
            level,
            row_offset,
            col_offset,
            rows,
            cols,
            cells,
        })
    }

    /// Parse a mask from text rows where `#` marks an occupied cell
    pub fn from_rows(level: u32, rows: &[&str]) -> Option<Self> {
        let cols = rows.first().map_or(0, |r| r.chars().count());
        if rows.iter().any(|r| r.chars().count() != cols) {
            return None;
        }
        let cells = rows.iter().flat_map(|r| r.chars().map(|c| c == '#')).collect();
        Self::new(level, 0, 0, rows.len() as u32, cols as u32, cells)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Occupancy at local (row, col), `false` outside the mask
    pub fn get(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols && self.cells[(row * self.cols + col) as usize]
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Slice levels `0..min(nz, max_layers)` into cropped masks, skipping empty levels
pub fn slice_layers(grid: &VoxelGrid, max_layers: u32) -> Vec<LayerMask> {
    let dims = grid.dims();
    let levels = dims.z.min(max_layers);
    if dims.z > max_layers {
        tracing::warn!(
            levels = dims.z,
            max_layers,
            "Grid is taller than the layer cap, upper levels dropped"
        );
    }

    let mut masks = Vec::new();
    for z in 0..levels {
        let occupied = |x: u32, y: u32| grid.get(IVec3::new(x as i32, y as i32, z as i32));

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..dims.y {
            for x in 0..dims.x {
                if occupied(x, y) {
                    bounds = Some(match bounds {
                        None => (x, x, y, y),
                        Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
                    });
                }
            }
        }

        let Some((x0, x1, y0, y1)) = bounds else {
            tracing::debug!(level = z, "Skipping empty level");
            continue;
        };

        let rows = x1 - x0 + 1;
        let cols = y1 - y0 + 1;
        let cells = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| occupied(x0 + r, y0 + c))
            .collect();

        masks.push(LayerMask {
            level: z,
            row_offset: x0,
            col_offset: y0,
            rows,
            cols,
            cells,
        });
    }

    tracing::info!(layers = masks.len(), "Sliced grid into layers");
    masks
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    #[test]
    fn test_crop_and_offset() {
        let grid = VoxelGrid::from_occupied(
            UVec3::new(6, 6, 1),
            [UVec3::new(2, 3, 0), UVec3::new(4, 3, 0), UVec3::new(3, 5, 0)],
        );
        let masks = slice_layers(&grid, DEFAULT_MAX_LAYERS);
        assert_eq!(masks.len(), 1);

        let mask = &masks[0];
        assert_eq!((mask.row_offset, mask.col_offset), (2, 3));
        assert_eq!((mask.rows(), mask.cols()), (3, 3));
        assert!(mask.get(0, 0));
        assert!(mask.get(2, 0));
        assert!(mask.get(1, 2));
        assert!(!mask.get(1, 1));
        assert_eq!(mask.occupied_count(), 3);
    }

    #[test]
    fn test_empty_levels_skipped() {
        let grid = VoxelGrid::from_occupied(
            UVec3::new(2, 2, 4),
            [UVec3::new(0, 0, 0), UVec3::new(1, 1, 2)],
        );
        let levels: Vec<_> = slice_layers(&grid, 30).iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![0, 2]);
    }

    #[test]
    fn test_layer_cap() {
        let grid = VoxelGrid::from_occupied(
            UVec3::new(1, 1, 5),
            (0..5).map(|z| UVec3::new(0, 0, z)),
        );
        let masks = slice_layers(&grid, 3);
        assert_eq!(masks.len(), 3);
        assert_eq!(masks.last().unwrap().level, 2);
    }

    #[test]
    fn test_from_rows() {
        let mask = LayerMask::from_rows(0, &["##.", ".##"]).unwrap();
        assert_eq!((mask.rows(), mask.cols()), (2, 3));
        assert!(mask.get(0, 1));
        assert!(!mask.get(1, 0));
        assert!(LayerMask::from_rows(0, &["##", "#"]).is_none());
    }
}

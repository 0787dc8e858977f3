//! Per-slice interior fill
//!
//! Each horizontal slice is filled independently: empty cells 4-connected to
//! the slice border are exterior, every other empty cell becomes occupied.

use glam::UVec3;

use crate::voxel::VoxelGrid;

/// Result of interior filling
#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub grid: VoxelGrid,
    /// Cells newly occupied
    pub filled: usize,
}

/// Fill enclosed voids in every horizontal (constant z) slice
pub fn fill_interior(mut grid: VoxelGrid) -> FillOutcome {
    let dims = grid.dims();
    let mut filled = 0;

    for z in 0..dims.z {
        let interior = enclosed_cells(&grid, z);
        filled += interior.len();
        for (x, y) in interior {
            grid.set(UVec3::new(x, y, z), true);
        }
    }

    tracing::info!(filled, "Filled slice interiors");
    FillOutcome { grid, filled }
}

/// Empty cells of slice `z` not reachable from the border
fn enclosed_cells(grid: &VoxelGrid, z: u32) -> Vec<(u32, u32)> {
    let (nx, ny) = (grid.dims().x, grid.dims().y);
    if nx == 0 || ny == 0 {
        return Vec::new();
    }
    let occupied = |x: u32, y: u32| grid.get(UVec3::new(x, y, z).as_ivec3());
    let slot = |x: u32, y: u32| (x + nx * y) as usize;

    // Flood fill from the slice border to mark exterior cells
    let mut exterior = vec![false; (nx * ny) as usize];
    let mut queue = Vec::new();

    let seed = |x: u32, y: u32, exterior: &mut Vec<bool>, queue: &mut Vec<(u32, u32)>| {
        if !occupied(x, y) && !exterior[slot(x, y)] {
            exterior[slot(x, y)] = true;
            queue.push((x, y));
        }
    };

    for x in 0..nx {
        seed(x, 0, &mut exterior, &mut queue);
        seed(x, ny - 1, &mut exterior, &mut queue);
    }
    for y in 0..ny {
        seed(0, y, &mut exterior, &mut queue);
        seed(nx - 1, y, &mut exterior, &mut queue);
    }

    while let Some((x, y)) = queue.pop() {
        if x > 0 {
            seed(x - 1, y, &mut exterior, &mut queue);
        }
        if x + 1 < nx {
            seed(x + 1, y, &mut exterior, &mut queue);
        }
        if y > 0 {
            seed(x, y - 1, &mut exterior, &mut queue);
        }
        if y + 1 < ny {
            seed(x, y + 1, &mut exterior, &mut queue);
        }
    }

    let mut interior = Vec::new();
    for y in 0..ny {
        for x in 0..nx {
            if !occupied(x, y) && !exterior[slot(x, y)] {
                interior.push((x, y));
            }
        }
    }
    interior
}

//! 26-connected component labeling and bridge repair
//!
//! After [`repair_connectivity`] every occupied voxel belongs to one
//! 26-connected component: each minor component is joined to the largest one
//! by a rasterized straight bridge between their closest voxels.

use std::collections::VecDeque;

use glam::IVec3;

use crate::voxel::VoxelGrid;

/// Offsets of the 26 neighbors of a cell
fn neighbor_offsets() -> impl Iterator<Item = IVec3> {
    (-1..=1).flat_map(|z| {
        (-1..=1).flat_map(move |y| {
            (-1..=1)
                .map(move |x| IVec3::new(x, y, z))
                .filter(|o| *o != IVec3::ZERO)
        })
    })
}

/// Per-cell component labels, 0 for empty cells
#[derive(Debug, Clone)]
pub struct ComponentLabeling {
    labels: Vec<u32>,
    sizes: Vec<usize>,
}

impl ComponentLabeling {
    /// Number of components
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Label of the cell at a flat grid index
    pub fn label_at(&self, index: usize) -> u32 {
        self.labels[index]
    }

    /// Voxel count of a label (1-based)
    pub fn size_of(&self, label: u32) -> usize {
        self.sizes[label as usize - 1]
    }

    /// Label with the most voxels; the lowest label wins ties
    pub fn largest(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for (i, &size) in self.sizes.iter().enumerate() {
            if best.map_or(true, |(_, best_size)| size > best_size) {
                best = Some((i as u32 + 1, size));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Cells of a component in scan order
    pub fn members(&self, grid: &VoxelGrid, label: u32) -> Vec<IVec3> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| grid.cell_at(i).as_ivec3())
            .collect()
    }
}

/// Label 26-connected components; labels are assigned in scan order
pub fn label_components(grid: &VoxelGrid) -> ComponentLabeling {
    let mut labels = vec![0u32; grid.len()];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..grid.len() {
        if !grid.cells()[start] || labels[start] != 0 {
            continue;
        }

        let label = sizes.len() as u32 + 1;
        let mut size = 0;
        labels[start] = label;
        queue.push_back(start);

        while let Some(index) = queue.pop_front() {
            size += 1;
            let cell = grid.cell_at(index).as_ivec3();
            for offset in neighbor_offsets() {
                let next = cell + offset;
                if !grid.get(next) {
                    continue;
                }
                let next_index = grid.index(next.as_uvec3());
                if labels[next_index] == 0 {
                    labels[next_index] = label;
                    queue.push_back(next_index);
                }
            }
        }

        sizes.push(size);
    }

    ComponentLabeling { labels, sizes }
}

/// Result of connectivity repair
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub grid: VoxelGrid,
    /// Components found before repair
    pub components: usize,
    /// Voxels newly occupied by bridges
    pub bridge_voxels: usize,
}

/// Smallest squared distance two distinct 26-components can have
const MIN_SEPARATION_SQ: i32 = 4;

/// Join every component to the largest one
///
/// Nearest pairs are found with the quadratic search over the minor component
/// and the original main-component voxels, first pair in scan order on ties.
pub fn repair_connectivity(mut grid: VoxelGrid) -> RepairOutcome {
    let labeling = label_components(&grid);
    let components = labeling.count();

    let Some(main) = labeling.largest().filter(|_| components > 1) else {
        return RepairOutcome {
            grid,
            components,
            bridge_voxels: 0,
        };
    };

    let main_cells = labeling.members(&grid, main);
    let mut bridge_voxels = 0;

    for label in (1..=components as u32).filter(|&l| l != main) {
        let minor_cells = labeling.members(&grid, label);
        let Some((from, to, dist_sq)) = closest_pair(&minor_cells, &main_cells) else {
            continue;
        };

        let added = rasterize_bridge(&mut grid, from, to, dist_sq);
        tracing::debug!(
            label,
            size = minor_cells.len(),
            distance = (dist_sq as f32).sqrt(),
            added,
            "Bridged component"
        );
        bridge_voxels += added;
    }

    tracing::info!(
        components,
        main_size = main_cells.len(),
        bridge_voxels,
        "Repaired voxel connectivity"
    );

    RepairOutcome {
        grid,
        components,
        bridge_voxels,
    }
}

/// Closest (minor, main) pair by squared Euclidean distance
fn closest_pair(minor: &[IVec3], main: &[IVec3]) -> Option<(IVec3, IVec3, i32)> {
    let mut best: Option<(IVec3, IVec3, i32)> = None;
    for &a in minor {
        for &b in main {
            let dist_sq = (a - b).length_squared();
            if best.map_or(true, |(_, _, d)| dist_sq < d) {
                best = Some((a, b, dist_sq));
                if dist_sq <= MIN_SEPARATION_SQ {
                    return best;
                }
            }
        }
    }
    best
}

/// Mark `ceil(distance) + 1` rounded points along the segment; returns newly set cells
fn rasterize_bridge(grid: &mut VoxelGrid, from: IVec3, to: IVec3, dist_sq: i32) -> usize {
    let steps = (dist_sq as f32).sqrt().ceil().max(1.0) as usize;
    let start = from.as_vec3();
    let delta = (to - from).as_vec3();

    let mut added = 0;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let point = (start + delta * t).round().as_ivec3();
        if grid.contains(point) && !grid.get(point) {
            grid.set(point.as_uvec3(), true);
            added += 1;
        }
    }
    added
}

/// Count components of a grid without keeping the labels
pub fn component_count(grid: &VoxelGrid) -> usize {
    label_components(grid).count()
}

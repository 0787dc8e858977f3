//! Property tests for packing coverage and connectivity repair

use glam::UVec3;
use proptest::prelude::*;

use brickify::repair::component_count;
use brickify::{pack_layer, repair_connectivity, BrickShape, LayerMask, ShapeCatalog, VoxelGrid};

fn mask_strategy() -> impl Strategy<Value = LayerMask> {
    (1u32..10, 1u32..10).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(any::<bool>(), (rows * cols) as usize)
            .prop_filter_map("mask size", move |cells| {
                LayerMask::new(0, 0, 0, rows, cols, cells)
            })
    })
}

fn grid_strategy() -> impl Strategy<Value = VoxelGrid> {
    (1u32..7, 1u32..7, 1u32..5).prop_flat_map(|(nx, ny, nz)| {
        prop::collection::vec(prop::bool::weighted(0.2), (nx * ny * nz) as usize).prop_map(
            move |cells| {
                let dims = UVec3::new(nx, ny, nz);
                let occupied = cells
                    .iter()
                    .enumerate()
                    .filter(|(_, &c)| c)
                    .map(|(i, _)| {
                        let i = i as u32;
                        UVec3::new(i % nx, (i / nx) % ny, i / (nx * ny))
                    })
                    .collect::<Vec<_>>();
                VoxelGrid::from_occupied(dims, occupied)
            },
        )
    })
}

fn shape_catalog_strategy() -> impl Strategy<Value = ShapeCatalog> {
    prop::collection::vec((1u32..5, 1u32..5), 0..6).prop_map(|shapes| {
        ShapeCatalog::new(shapes.into_iter().map(|(h, w)| BrickShape::new(h, w)).collect())
            .expect("non-zero shapes")
    })
}

fn coverage_counts(mask: &LayerMask, catalog: &ShapeCatalog) -> Vec<u32> {
    let mut counts = vec![0u32; (mask.rows() * mask.cols()) as usize];
    for p in pack_layer(mask, catalog) {
        for r in p.row..p.row + p.height {
            for c in p.col..p.col + p.width {
                counts[(r * mask.cols() + c) as usize] += 1;
            }
        }
    }
    counts
}

proptest! {
    #[test]
    fn packing_reproduces_mask(mask in mask_strategy()) {
        let counts = coverage_counts(&mask, &ShapeCatalog::default());
        for row in 0..mask.rows() {
            for col in 0..mask.cols() {
                let expected = u32::from(mask.get(row, col));
                prop_assert_eq!(counts[(row * mask.cols() + col) as usize], expected);
            }
        }
    }

    #[test]
    fn packing_reproduces_mask_with_any_catalog(
        mask in mask_strategy(),
        catalog in shape_catalog_strategy(),
    ) {
        let counts = coverage_counts(&mask, &catalog);
        for row in 0..mask.rows() {
            for col in 0..mask.cols() {
                let expected = u32::from(mask.get(row, col));
                prop_assert_eq!(counts[(row * mask.cols() + col) as usize], expected);
            }
        }
    }

    #[test]
    fn repair_leaves_one_component(grid in grid_strategy()) {
        let original: Vec<UVec3> = grid.occupied().collect();
        let outcome = repair_connectivity(grid);

        let expected = usize::from(!original.is_empty());
        prop_assert_eq!(component_count(&outcome.grid), expected);
        for cell in original {
            prop_assert!(outcome.grid.get(cell.as_ivec3()));
        }
    }
}

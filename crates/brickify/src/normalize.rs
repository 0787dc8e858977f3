//! Rescale and center a mesh inside the target build box

use glam::Vec3;

use crate::types::{BrickifyError, Mesh, Result};

/// Uniformly scale `mesh` to fit `[0,w]×[0,h]×[0,d]` and center it there
///
/// The scale is the smallest per-axis ratio `target / extent`, so the mesh
/// touches the box along its tightest axis and is centered along the others.
pub fn normalize_mesh(mesh: &Mesh, target: Vec3) -> Result<Mesh> {
    if !target.cmpgt(Vec3::ZERO).all() || !target.is_finite() {
        return Err(BrickifyError::InvalidConfig(format!(
            "Target dimensions must be positive, got {:?}",
            target.to_array()
        )));
    }

    let (min, max) = mesh
        .bounds()
        .ok_or_else(|| BrickifyError::InvalidMesh("Mesh has no vertices".to_string()))?;
    let extent = max - min;

    for (axis, value) in ['x', 'y', 'z'].into_iter().zip(extent.to_array()) {
        if value <= 0.0 {
            return Err(BrickifyError::DegenerateMesh { axis });
        }
    }

    let scale = (target / extent).min_element();
    let offset = (target - extent * scale) * 0.5;

    tracing::debug!(scale, ?offset, "Normalizing mesh");

    Ok(mesh.map_positions(|v| (v - min) * scale + offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_mesh(size: Vec3) -> Mesh {
        Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [size.x, 0.0, 0.0],
                [0.0, size.y, 0.0],
                [0.0, 0.0, size.z],
                [size.x, size.y, size.z],
            ],
            vec![[0, 1, 2], [0, 2, 3], [1, 2, 4]],
        )
    }

    #[test]
    fn test_fits_tightest_axis_and_centers() {
        let mesh = box_mesh(Vec3::new(2.0, 1.0, 1.0));
        let out = normalize_mesh(&mesh, Vec3::new(10.0, 10.0, 10.0)).unwrap();
        let (min, max) = out.bounds().unwrap();

        // scale 5 along x, remaining axes centered
        assert!((min - Vec3::new(0.0, 2.5, 2.5)).length() < 1e-5);
        assert!((max - Vec3::new(10.0, 7.5, 7.5)).length() < 1e-5);
    }

    #[test]
    fn test_translated_input() {
        let mut mesh = box_mesh(Vec3::splat(4.0));
        for v in &mut mesh.vertices {
            v[0] -= 100.0;
            v[2] += 7.0;
        }
        let out = normalize_mesh(&mesh, Vec3::new(8.0, 8.0, 4.0)).unwrap();
        let (min, max) = out.bounds().unwrap();
        assert!((min - Vec3::new(2.0, 2.0, 0.0)).length() < 1e-5);
        assert!((max - Vec3::new(6.0, 6.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn test_zero_extent_is_degenerate() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        );
        let err = normalize_mesh(&mesh, Vec3::splat(10.0)).unwrap_err();
        assert!(matches!(err, BrickifyError::DegenerateMesh { axis: 'z' }));
    }

    #[test]
    fn test_non_positive_target_rejected() {
        let mesh = box_mesh(Vec3::ONE);
        assert!(matches!(
            normalize_mesh(&mesh, Vec3::new(1.0, 0.0, 1.0)),
            Err(BrickifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_colors_preserved() {
        let mesh = box_mesh(Vec3::ONE).with_vertex_colors(vec![[0.5, 0.5, 0.5]; 5]);
        let out = normalize_mesh(&mesh, Vec3::splat(2.0)).unwrap();
        assert_eq!(out.vertex_colors, mesh.vertex_colors);
        assert_eq!(out.faces, mesh.faces);
    }
}

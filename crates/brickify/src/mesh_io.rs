//! Mesh file loading
//!
//! Wavefront OBJ files go through `tobj`; JSON mesh documents use the same
//! `vertices` / `faces` / `vertex_colors` layout the generation server returns.

use std::path::Path;

use serde::Deserialize;

use crate::types::{normalize_color_range, BrickifyError, Mesh, Result};

/// Load a mesh from disk, dispatching on the file extension
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let mesh = match extension.as_deref() {
        Some("obj") => load_obj(path)?,
        Some("json") => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                BrickifyError::MeshLoad(format!("Failed to read {}: {}", path.display(), e))
            })?;
            parse_json_mesh(&text)?
        }
        _ => {
            return Err(BrickifyError::MeshLoad(format!(
                "Unsupported mesh format: {}",
                path.display()
            )))
        }
    };

    tracing::info!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        colored = mesh.has_vertex_colors(),
        "Loaded mesh"
    );
    Ok(mesh)
}

/// Load an OBJ file, merging every model into a single triangle soup
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj(path, &options)
        .map_err(|e| BrickifyError::MeshLoad(format!("{}: {}", path.display(), e)))?;

    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let mut colors = Vec::new();
    let mut all_colored = true;

    for model in &models {
        let mesh = &model.mesh;
        let base = vertices.len() as u32;
        let count = mesh.positions.len() / 3;

        vertices.extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
        faces.extend(
            mesh.indices
                .chunks_exact(3)
                .map(|f| [f[0] + base, f[1] + base, f[2] + base]),
        );

        if mesh.vertex_color.len() == count * 3 && count > 0 {
            colors.extend(mesh.vertex_color.chunks_exact(3).map(|c| [c[0], c[1], c[2]]));
        } else if count > 0 {
            all_colored = false;
        }
    }

    if !all_colored && !colors.is_empty() {
        tracing::warn!(
            path = %path.display(),
            "Only some OBJ models carry vertex colors, ignoring colors"
        );
    }

    let mut mesh = Mesh::new(vertices, faces);
    if all_colored && !colors.is_empty() {
        mesh = mesh.with_vertex_colors(colors);
    }
    finish(mesh)
}

#[derive(Deserialize)]
struct JsonMesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[u32; 3]>,
    #[serde(default)]
    vertex_colors: Option<Vec<[f32; 3]>>,
}

/// Parse a JSON mesh document
pub fn parse_json_mesh(text: &str) -> Result<Mesh> {
    let parsed: JsonMesh = serde_json::from_str(text)
        .map_err(|e| BrickifyError::MeshLoad(format!("Invalid mesh JSON: {}", e)))?;

    let mesh = Mesh {
        vertices: parsed.vertices,
        faces: parsed.faces,
        vertex_colors: parsed
            .vertex_colors
            .filter(|colors| !colors.is_empty())
            .map(normalize_color_range),
    };
    finish(mesh)
}

fn finish(mesh: Mesh) -> Result<Mesh> {
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(BrickifyError::InvalidMesh(
            "Mesh has no triangles".to_string(),
        ));
    }
    mesh.validate()?;
    Ok(mesh)
}

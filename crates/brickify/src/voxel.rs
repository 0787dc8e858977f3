//! Dense boolean voxel grid and surface voxelization

use glam::{IVec3, UVec3, Vec3};

use crate::types::{BrickifyError, Mesh, Result};

/// Placement of grid space inside mesh space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub origin: Vec3,
    pub pitch: f32,
}

impl GridFrame {
    /// Map a point in grid coordinates to mesh space
    pub fn to_world(self, point: Vec3) -> Vec3 {
        self.origin + point * self.pitch
    }
}

/// Flat boolean occupancy grid
///
/// Cell `(x, y, z)` lives at `x + nx * (y + ny * z)`. Cell `(0, 0, 0)` spans
/// `origin .. origin + pitch` in mesh space.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    dims: UVec3,
    origin: Vec3,
    pitch: f32,
    cells: Vec<bool>,
}

impl VoxelGrid {
    /// Create an empty grid
    pub fn new(dims: UVec3, origin: Vec3, pitch: f32) -> Self {
        let len = dims.x as usize * dims.y as usize * dims.z as usize;
        Self {
            dims,
            origin,
            pitch,
            cells: vec![false; len],
        }
    }

    /// Build a unit-pitch grid at the origin from a list of occupied cells
    pub fn from_occupied(dims: UVec3, occupied: impl IntoIterator<Item = UVec3>) -> Self {
        let mut grid = Self::new(dims, Vec3::ZERO, 1.0);
        for cell in occupied {
            grid.set(cell, true);
        }
        grid
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell is occupied
    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Check whether a cell lies inside the grid
    pub fn contains(&self, cell: IVec3) -> bool {
        cell.cmpge(IVec3::ZERO).all() && cell.as_uvec3().cmplt(self.dims).all()
    }

    #[inline]
    pub fn index(&self, cell: UVec3) -> usize {
        let (nx, ny) = (self.dims.x as usize, self.dims.y as usize);
        cell.x as usize + nx * (cell.y as usize + ny * cell.z as usize)
    }

    /// Inverse of [`VoxelGrid::index`]
    #[inline]
    pub fn cell_at(&self, index: usize) -> UVec3 {
        let nx = self.dims.x as usize;
        let ny = self.dims.y as usize;
        UVec3::new(
            (index % nx) as u32,
            ((index / nx) % ny) as u32,
            (index / (nx * ny)) as u32,
        )
    }

    /// Occupancy of a cell, `false` outside the grid
    pub fn get(&self, cell: IVec3) -> bool {
        self.contains(cell) && self.cells[self.index(cell.as_uvec3())]
    }

    /// Set a cell inside the grid; out of range cells are ignored
    pub fn set(&mut self, cell: UVec3, value: bool) {
        if cell.cmplt(self.dims).all() {
            let idx = self.index(cell);
            self.cells[idx] = value;
        }
    }

    pub(crate) fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Iterate occupied cells in scan order (x fastest, then y, then z)
    pub fn occupied(&self) -> impl Iterator<Item = UVec3> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c)
            .map(|(i, _)| self.cell_at(i))
    }

    pub fn frame(&self) -> GridFrame {
        GridFrame {
            origin: self.origin,
            pitch: self.pitch,
        }
    }

    /// Cell containing a mesh-space point, clamped into the grid
    fn cell_of(&self, point: Vec3) -> UVec3 {
        let max = self.dims.saturating_sub(UVec3::ONE).as_vec3();
        ((point - self.origin) / self.pitch)
            .floor()
            .clamp(Vec3::ZERO, max)
            .as_uvec3()
    }
}

/// Tolerance absorbing float noise when the extent is an exact pitch multiple
const DIM_EPSILON: f32 = 1e-3;

/// Rasterize the surface of `mesh` into a shell voxel grid
///
/// The grid origin is the mesh bounding-box minimum and each axis holds
/// `max(1, ceil(extent / pitch - 1e-3))` cells. Points on the maximum face
/// clamp into the last cell. An empty mesh yields an empty grid.
pub fn voxelize(mesh: &Mesh, pitch: f32) -> Result<VoxelGrid> {
    if !(pitch > 0.0 && pitch.is_finite()) {
        return Err(BrickifyError::InvalidConfig(format!(
            "Pitch must be positive, got {}",
            pitch
        )));
    }

    let Some((min, max)) = mesh.bounds().filter(|_| !mesh.faces.is_empty()) else {
        tracing::warn!("Voxelizing empty mesh");
        return Ok(VoxelGrid::new(UVec3::ZERO, Vec3::ZERO, pitch));
    };

    let dims = ((max - min) / pitch - DIM_EPSILON)
        .ceil()
        .max(Vec3::ONE)
        .as_uvec3();
    let mut grid = VoxelGrid::new(dims, min, pitch);

    for face in &mesh.faces {
        let [v0, v1, v2] = face.map(|i| Vec3::from_array(mesh.vertices[i as usize]));
        for point in sample_triangle_surface(v0, v1, v2, pitch) {
            let cell = grid.cell_of(point);
            grid.set(cell, true);
        }
    }

    tracing::info!(
        dims = ?dims.to_array(),
        occupied = grid.occupied_count(),
        "Voxelized mesh surface"
    );
    Ok(grid)
}

/// Sample points on a triangle surface at half-pitch spacing
///
/// Barycentric lattice including the corners and all three edges.
fn sample_triangle_surface(v0: Vec3, v1: Vec3, v2: Vec3, pitch: f32) -> Vec<Vec3> {
    let longest = (v1 - v0)
        .length()
        .max((v2 - v1).length())
        .max((v0 - v2).length());
    let steps = ((longest / pitch) * 2.0).ceil().max(1.0) as usize;

    let mut samples = Vec::with_capacity((steps + 1) * (steps + 2) / 2);
    for i in 0..=steps {
        for j in 0..=(steps - i) {
            let u = i as f32 / steps as f32;
            let v = j as f32 / steps as f32;
            let w = (1.0 - u - v).max(0.0);
            samples.push(v0 * w + v1 * u + v2 * v);
        }
    }
    samples
}

//! Mesh to brick model conversion
//!
//! This crate turns a triangle mesh into stacked layers of rectangular bricks
//! and writes them as an LDraw model.
//!
//! # Pipeline
//!
//! 1. **Load**: OBJ or JSON mesh, optional per-vertex colors
//! 2. **Normalize**: uniform scale into a `r × r × r/2` box, centered
//! 3. **Voxelize**: shell voxels from dense surface sampling
//! 4. **Repair**: bridge every 26-connected component to the largest one
//! 5. **Fill**: close enclosed voids slice by slice
//! 6. **Slice and pack**: greedy brick cover of each level, in parallel
//! 7. **Color**: nearest vertex color mapped to the closest catalog color
//! 8. **Serialize**: LDraw part lines, brick plan or parts list
//!
//! # Example
//!
//! ```no_run
//! use brickify::{convert_file, ConvertConfig, OutputFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConvertConfig::new(48).with_fill_interior(true);
//!     let conversion = convert_file("model.obj", "model.ldr", &config, OutputFormat::Ldr)?;
//!
//!     println!(
//!         "Placed {} bricks in {} layers",
//!         conversion.stats.bricks, conversion.stats.layers
//!     );
//!     Ok(())
//! }
//! ```

pub mod color;
pub mod config;
pub mod convert;
pub mod fill;
pub mod layers;
pub mod ldraw;
pub mod mesh_io;
pub mod normalize;
pub mod packer;
pub mod repair;
pub mod types;
pub mod voxel;

pub use color::{CatalogColor, ColorCatalog, VertexColorIndex};
pub use config::ConvertConfig;
pub use convert::{convert_file, convert_mesh, write_atomic, Conversion, ConversionStats, OutputFormat};
pub use layers::{slice_layers, LayerMask};
pub use ldraw::{brick_plan, level_from_y, LDrawDocument, LDrawHeader, PartsList};
pub use mesh_io::load_mesh;
pub use packer::{pack_layer, BrickShape, ShapeCatalog};
pub use repair::{label_components, repair_connectivity};
pub use types::{BrickLayer, BrickPlacement, BrickifyError, Mesh, Result};
pub use voxel::{voxelize, VoxelGrid};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::color::ColorCatalog;
    pub use crate::config::ConvertConfig;
    pub use crate::convert::{convert_file, convert_mesh, Conversion, OutputFormat};
    pub use crate::ldraw::LDrawDocument;
    pub use crate::types::{BrickLayer, BrickPlacement, BrickifyError, Mesh};
}

//! Brick color catalog and nearest-color assignment
//!
//! Each placement samples the mesh vertex nearest to its centroid and is given
//! the catalog color closest to that vertex color in HSL space.

use std::collections::HashMap;
use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use kiddo::{KdTree, SquaredEuclidean};
use serde::Deserialize;

use crate::types::{normalize_color_range, BrickLayer, BrickPlacement, BrickifyError, Mesh, Result};
use crate::voxel::GridFrame;

// =============================================================================
// HSL
// =============================================================================

/// Hue, saturation and lightness, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    /// Convert an RGB color in [0, 1]
    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        let [r, g, b] = rgb;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Self { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let h = if max == r {
            (g - b) / delta
        } else if max == g {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };

        Self {
            h: (h / 6.0).rem_euclid(1.0),
            s,
            l,
        }
    }
}

/// Weighted HSL distance with a circular hue term
pub fn hsl_distance(a: Hsl, b: Hsl) -> f32 {
    let dh = (a.h - b.h).abs();
    let hue = dh.min(1.0 - dh);
    2.0 * hue + 0.5 * (a.s - b.s).abs() + 0.5 * (a.l - b.l).abs()
}

// =============================================================================
// Catalog
// =============================================================================

/// One selectable brick color
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColor {
    pub code: u32,
    pub name: String,
    /// RGB in [0, 1]
    pub rgb: [f32; 3],
}

impl CatalogColor {
    pub fn new(code: u32, name: impl Into<String>, rgb: [f32; 3]) -> Self {
        Self {
            code,
            name: name.into(),
            rgb,
        }
    }

    /// Hex notation `#RRGGBB`
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// Basic LDraw solid colors 0-15
const LDRAW_BASIC: [(u32, &str, &str); 16] = [
    (0, "Black", "#05131D"),
    (1, "Blue", "#0055BF"),
    (2, "Green", "#237841"),
    (3, "Dark Turquoise", "#008F9B"),
    (4, "Red", "#C91A09"),
    (5, "Dark Pink", "#C870A0"),
    (6, "Brown", "#583927"),
    (7, "Light Gray", "#9BA19D"),
    (8, "Dark Gray", "#6D6E5C"),
    (9, "Light Blue", "#B4D2E3"),
    (10, "Bright Green", "#4B9F4A"),
    (11, "Turquoise", "#55A5AF"),
    (12, "Salmon", "#F2705E"),
    (13, "Pink", "#FC97AC"),
    (14, "Yellow", "#F2CD37"),
    (15, "White", "#FFFFFF"),
];

/// Parse `#RRGGBB` (the `#` is optional) into RGB in [0, 1]
pub fn parse_hex(hex: &str) -> Result<[f32; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(BrickifyError::Catalog(format!("Invalid hex color: {}", hex)));
    }

    let mut rgb = [0.0; 3];
    for (i, c) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| BrickifyError::Catalog(format!("Invalid hex color: {}", hex)))?;
        *c = byte as f32 / 255.0;
    }
    Ok(rgb)
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "color")]
    colors: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    code: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hex: Option<String>,
    #[serde(default)]
    rgb: Option<[f32; 3]>,
}

/// Non-empty ordered list of brick colors
#[derive(Debug, Clone)]
pub struct ColorCatalog {
    colors: Vec<CatalogColor>,
    hsl: Vec<Hsl>,
}

impl ColorCatalog {
    /// Create a catalog; an empty list is rejected
    pub fn new(colors: Vec<CatalogColor>) -> Result<Self> {
        if colors.is_empty() {
            return Err(BrickifyError::Catalog("Color catalog is empty".to_string()));
        }
        let hsl = colors.iter().map(|c| Hsl::from_rgb(c.rgb)).collect();
        Ok(Self { colors, hsl })
    }

    /// The 16 basic LDraw colors
    pub fn ldraw_basic() -> Self {
        let colors = LDRAW_BASIC
            .iter()
            .filter_map(|(code, name, hex)| {
                parse_hex(hex).ok().map(|rgb| CatalogColor::new(*code, *name, rgb))
            })
            .collect::<Vec<_>>();
        let hsl = colors.iter().map(|c| Hsl::from_rgb(c.rgb)).collect();
        Self { colors, hsl }
    }

    /// Parse a TOML catalog made of `[[color]]` tables
    ///
    /// ```toml
    /// [[color]]
    /// code = 4
    /// name = "Red"
    /// hex = "#C91A09"
    /// ```
    ///
    /// `rgb = [r, g, b]` may replace `hex`; 0-255 values are normalized.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text)
            .map_err(|e| BrickifyError::Catalog(format!("Invalid catalog TOML: {}", e)))?;

        let mut colors = Vec::with_capacity(file.colors.len());
        for entry in file.colors {
            let rgb = match (&entry.hex, entry.rgb) {
                (Some(hex), _) => parse_hex(hex)?,
                (None, Some(rgb)) => normalize_color_range(vec![rgb])[0],
                (None, None) => {
                    return Err(BrickifyError::Catalog(format!(
                        "Color {} has neither hex nor rgb",
                        entry.code
                    )))
                }
            };
            let name = entry.name.unwrap_or_else(|| format!("Color {}", entry.code));
            colors.push(CatalogColor::new(entry.code, name, rgb));
        }
        Self::new(colors)
    }

    /// Parse LDraw `0 !COLOUR <name> CODE <n> VALUE #RRGGBB ...` lines
    ///
    /// Other lines are ignored. Entries are sorted by code.
    pub fn from_ldconfig_str(text: &str) -> Result<Self> {
        let mut colors = Vec::new();
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some("0") || tokens.next() != Some("!COLOUR") {
                continue;
            }
            let Some(name) = tokens.next() else { continue };

            let mut code = None;
            let mut value = None;
            while let Some(token) = tokens.next() {
                match token {
                    "CODE" => code = tokens.next().and_then(|t| t.parse::<u32>().ok()),
                    "VALUE" => value = tokens.next(),
                    _ => {}
                }
            }

            if let (Some(code), Some(value)) = (code, value) {
                colors.push(CatalogColor::new(code, name.replace('_', " "), parse_hex(value)?));
            }
        }
        colors.sort_by_key(|c| c.code);
        Self::new(colors)
    }

    /// Load a catalog file; `.ldr` files use LDConfig syntax, anything else TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BrickifyError::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_ldconfig = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ldr"));

        let catalog = if is_ldconfig {
            Self::from_ldconfig_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        tracing::info!(path = %path.display(), colors = catalog.len(), "Loaded color catalog");
        Ok(catalog)
    }

    pub fn colors(&self) -> &[CatalogColor] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Catalog color nearest to `rgb` by [`hsl_distance`]; first entry wins ties
    pub fn nearest(&self, rgb: [f32; 3]) -> &CatalogColor {
        let target = Hsl::from_rgb(rgb);

        let mut best_index = 0;
        let mut best_distance = f32::MAX;
        for (i, hsl) in self.hsl.iter().enumerate() {
            let distance = hsl_distance(target, *hsl);
            if distance < best_distance {
                best_distance = distance;
                best_index = i;
            }
        }

        &self.colors[best_index]
    }
}

impl Default for ColorCatalog {
    fn default() -> Self {
        Self::ldraw_basic()
    }
}

// =============================================================================
// Vertex Color Lookup
// =============================================================================

/// Nearest-vertex color lookup over mesh positions
///
/// Positions are stored rotated by a fixed generic rotation. Distances are
/// unchanged, but vertices on an axis-aligned plane no longer share a
/// coordinate on any split axis, which the k-d tree cannot bucket.
/// Coincident vertices keep only the first occurrence.
pub struct VertexColorIndex {
    tree: KdTree<f32, 3>,
    rotation: Quat,
    colors: Vec<[f32; 3]>,
}

impl VertexColorIndex {
    /// Build the index; `None` when the mesh carries no colors
    ///
    /// Colors in the 0-255 range are scaled to [0, 1] here, however the mesh
    /// was constructed.
    pub fn new(mesh: &Mesh) -> Option<Self> {
        let colors = mesh.vertex_colors.as_ref()?;
        if colors.is_empty() || colors.len() != mesh.vertices.len() {
            return None;
        }

        let rotation = Quat::from_euler(EulerRot::ZYX, 0.7137, 0.3821, 0.5419);
        let mut tree: KdTree<f32, 3> = KdTree::with_capacity(mesh.vertices.len());
        let mut seen = HashMap::with_capacity(mesh.vertices.len());
        for (i, v) in mesh.vertices.iter().enumerate() {
            // -0.0 and 0.0 are the same point
            let key = v.map(|c| (c + 0.0).to_bits());
            if seen.insert(key, i).is_none() {
                let p = rotation * Vec3::from_array(*v);
                tree.add(&p.to_array(), i as u64);
            }
        }

        Some(Self {
            tree,
            rotation,
            colors: normalize_color_range(colors.clone()),
        })
    }

    /// Color of the vertex nearest to `point`
    pub fn color_at(&self, point: Vec3) -> [f32; 3] {
        let query = (self.rotation * point).to_array();
        let nearest = self.tree.nearest_one::<SquaredEuclidean>(&query);
        self.colors[nearest.item as usize]
    }
}

/// Centroid of a placement in grid coordinates
pub fn placement_centroid(layer: &BrickLayer, placement: &BrickPlacement) -> Vec3 {
    Vec3::new(
        (layer.row_offset + placement.row) as f32 + placement.height as f32 / 2.0,
        (layer.col_offset + placement.col) as f32 + placement.width as f32 / 2.0,
        layer.level as f32 + 0.5,
    )
}

/// Give every placement of `layer` its nearest catalog color
pub fn assign_layer_colors(
    layer: &mut BrickLayer,
    frame: GridFrame,
    index: &VertexColorIndex,
    catalog: &ColorCatalog,
) {
    for i in 0..layer.placements.len() {
        let centroid = frame.to_world(placement_centroid(layer, &layer.placements[i]));
        let color = catalog.nearest(index.color_at(centroid));
        layer.placements[i].color = Some(color.code);
    }
}

//! LDraw serialization of brick layers
//!
//! Every placement becomes one type-1 line with an identity rotation:
//!
//! ```text
//! 1 <color> <x> <y> <z> 1 0 0 0 1 0 0 0 1 <part>.dat
//! ```
//!
//! LDraw's -Y axis points up, so level `n` sits at `y = -24n`.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use crate::types::BrickLayer;

/// Grid cell length along X and Z in LDraw units
pub const BRICK_LENGTH_LDU: i32 = 20;

/// Brick height in LDraw units
pub const BRICK_HEIGHT_LDU: i32 = 24;

/// Color used for placements without an assigned color (yellow)
pub const DEFAULT_COLOR_CODE: u32 = 14;

/// Part used for footprints missing from the part table
pub const DEFAULT_PART: &str = "3001.dat";

/// LDraw part for a (rows, cols) footprint
pub fn part_for_shape(height: u32, width: u32) -> &'static str {
    match (height, width) {
        (1, 1) => "3005.dat",
        (1, 2) | (2, 1) => "3004.dat",
        (2, 2) => "3003.dat",
        (2, 4) => "3001.dat",
        (4, 2) => "87079.dat",
        (1, 4) | (4, 1) => "3010.dat",
        _ => DEFAULT_PART,
    }
}

/// Layer index encoded by a part line's y coordinate
pub fn level_from_y(y: i32) -> i32 {
    (-y).div_euclid(BRICK_HEIGHT_LDU)
}

/// Comment lines opening a standalone model file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LDrawHeader {
    pub title: String,
    pub name: String,
    pub author: String,
}

impl Default for LDrawHeader {
    fn default() -> Self {
        Self {
            title: "LEGO Model Generated from OBJ".to_string(),
            name: "Brickify Model".to_string(),
            author: "Brickify".to_string(),
        }
    }
}

/// One placed part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartLine {
    pub color: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub part: &'static str,
}

impl std::fmt::Display for PartLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "1 {} {} {} {} 1 0 0 0 1 0 0 0 1 {}",
            self.color, self.x, self.y, self.z, self.part
        )
    }
}

/// Header plus part lines, in layer order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LDrawDocument {
    header: LDrawHeader,
    lines: Vec<PartLine>,
}

impl LDrawDocument {
    /// Convert layers to part lines; uncolored placements use `default_color`
    pub fn from_layers(layers: &[BrickLayer], default_color: u32) -> Self {
        let lines = layers
            .iter()
            .flat_map(|layer| {
                layer.placements.iter().map(move |p| PartLine {
                    color: p.color.unwrap_or(default_color),
                    x: (p.col + layer.col_offset) as i32 * BRICK_LENGTH_LDU,
                    y: -(layer.level as i32) * BRICK_HEIGHT_LDU,
                    z: (p.row + layer.row_offset) as i32 * BRICK_LENGTH_LDU,
                    part: part_for_shape(p.height, p.width),
                })
            })
            .collect();

        Self {
            header: LDrawHeader::default(),
            lines,
        }
    }

    pub fn with_header(mut self, header: LDrawHeader) -> Self {
        self.header = header;
        self
    }

    pub fn header(&self) -> &LDrawHeader {
        &self.header
    }

    pub fn lines(&self) -> &[PartLine] {
        &self.lines
    }

    pub fn part_count(&self) -> usize {
        self.lines.len()
    }

    /// Part lines only, one per line
    pub fn body_string(&self) -> String {
        let mut output = String::new();
        for line in &self.lines {
            let _ = writeln!(output, "{}", line);
        }
        output
    }

    /// Complete model file: header, blank line, part lines
    pub fn to_ldr_string(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "0 {}", self.header.title);
        let _ = writeln!(output, "0 Name: {}", self.header.name);
        let _ = writeln!(output, "0 Author: {}", self.header.author);
        let _ = writeln!(output, "0 !LDRAW_ORG Unofficial_Model");
        let _ = writeln!(
            output,
            "0 !LICENSE Redistributable under CCAL version 2.0 : see CAreadme.txt"
        );
        let _ = writeln!(output);
        output.push_str(&self.body_string());
        output
    }

    /// Count parts by part id and by (part id, color)
    pub fn parts_list(&self) -> PartsList {
        let mut list = PartsList::default();
        for line in &self.lines {
            *list.by_part.entry(line.part).or_default() += 1;
            *list.by_part_color.entry((line.part, line.color)).or_default() += 1;
        }
        list
    }
}

/// Part usage counts, sorted by part id then color
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartsList {
    pub by_part: BTreeMap<&'static str, usize>,
    pub by_part_color: BTreeMap<(&'static str, u32), usize>,
}

impl PartsList {
    pub fn total(&self) -> usize {
        self.by_part.values().sum()
    }
}

impl std::fmt::Display for PartsList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (part, count) in &self.by_part {
            writeln!(f, "{} x{}", part, count)?;
            for ((_, color), count) in self.by_part_color.range((*part, 0)..=(*part, u32::MAX)) {
                writeln!(f, "  color {}: {}", color, count)?;
            }
        }
        write!(f, "total: {}", self.total())
    }
}

/// Plain-text per-layer brick report
///
/// Coordinates are grid cells: `x` is the column, `y` the row, `z` the level,
/// and sizes are written as `<width>x<height>`.
pub fn brick_plan(layers: &[BrickLayer]) -> String {
    let mut output = String::new();
    for layer in layers {
        let _ = writeln!(output, "Layer {}:", layer.level);
        for p in &layer.placements {
            let _ = writeln!(
                output,
                "  Brick at (x={}, y={}, z={}) size=({}x{})",
                p.col + layer.col_offset,
                p.row + layer.row_offset,
                layer.level,
                p.width,
                p.height
            );
        }
    }
    output
}

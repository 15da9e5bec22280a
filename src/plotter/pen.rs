pub use csscolorparser::parse as parse_css_color;
pub use csscolorparser::Color as CssColor;
use image::Rgb;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use super::PenParseError;

/// Field separator of a pen-definition line.
pub const FIELD_SEPARATOR: &str = " | ";

/// A physical pen: one approximated colour, parked at a known home position.
///
/// The palette colour is in the same channel order as the [`image::RgbImage`]
/// buffers the raster stages work on, so pixels can be compared against it
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub label: String,
    pub hex: String,
    pub palette: Rgb<u8>,
    /// Home position relative to the pen pickup offset.
    pub rel_home: Vector3<f64>,
    /// Home position in machine coordinates.
    pub abs_home: Vector3<f64>,
}

impl Pen {
    pub fn new(label: &str, hex: &str, rel_home: Vector3<f64>, pen_offset: &Vector3<f64>) -> Option<Pen> {
        let palette = decode_hex(hex)?;
        Some(Pen {
            label: label.to_string(),
            hex: hex.to_string(),
            palette,
            rel_home,
            abs_home: rel_home + pen_offset,
        })
    }

    /// Parses a single `#RRGGBB | x y z | label` record. `line` is only used
    /// for error reporting.
    pub fn from_record(
        record: &str,
        line: usize,
        pen_offset: &Vector3<f64>,
    ) -> Result<Pen, PenParseError> {
        let fields: Vec<&str> = record.trim_end().splitn(3, FIELD_SEPARATOR).collect();
        if fields.len() < 3 {
            return Err(PenParseError::MissingFields {
                line,
                found: fields.len(),
            });
        }
        let (hex, home, label) = (fields[0].trim(), fields[1], fields[2]);

        let home_parts = home
            .split_whitespace()
            .map(|part| part.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| PenParseError::home(line, home))?;
        if home_parts.len() != 3 {
            return Err(PenParseError::home(line, home));
        }
        let rel_home = Vector3::new(home_parts[0], home_parts[1], home_parts[2]);

        Pen::new(label, hex, rel_home, pen_offset).ok_or_else(|| PenParseError::InvalidHex {
            line,
            value: hex.to_string(),
        })
    }
}

/// Decodes a strict `#RRGGBB` string into a palette colour.
pub fn decode_hex(hex: &str) -> Option<Rgb<u8>> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let color: CssColor = parse_css_color(hex).ok()?;
    let [r, g, b, _] = color.to_rgba8();
    Some(Rgb([r, g, b]))
}

/// The ordered list of pens loaded for a run. Order matters: it breaks ties in
/// the quantizer and decides which pen claims a pixel when two share a colour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PenRegistry {
    pens: Vec<Pen>,
}

impl PenRegistry {
    pub fn new(pens: Vec<Pen>) -> PenRegistry {
        PenRegistry { pens }
    }

    /// Reads one pen per line. Blank lines are skipped; any malformed record
    /// fails the whole load.
    pub fn from_reader<R: BufRead>(
        reader: R,
        pen_offset: &Vector3<f64>,
    ) -> Result<PenRegistry, PenParseError> {
        let mut pens = Vec::new();
        for (i, record) in reader.lines().enumerate() {
            let record = record?;
            if record.trim().is_empty() {
                continue;
            }
            pens.push(Pen::from_record(&record, i + 1, pen_offset)?);
        }
        debug!(count = pens.len(), "Loaded pen definitions");
        Ok(PenRegistry { pens })
    }

    pub fn from_file(path: &Path, pen_offset: &Vector3<f64>) -> Result<PenRegistry, PenParseError> {
        let file = File::open(path)?;
        PenRegistry::from_reader(BufReader::new(file), pen_offset)
    }

    pub fn pens(&self) -> &[Pen] {
        &self.pens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pen> {
        self.pens.iter()
    }

    pub fn len(&self) -> usize {
        self.pens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pens.is_empty()
    }
}

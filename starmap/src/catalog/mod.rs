//! Star catalogs module
//!
//! This module turns raw tabular catalog rows into typed [`StarRecord`]s and
//! holds the loaded record set. Catalogs such as HYG are sparse: many rows
//! lack names, color indices or even coordinates, so normalization is
//! lenient about everything except position.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use loader::{
    fetch_catalog_text, load_catalog, parse_catalog_text, spawn_catalog_load, CatalogSource,
    LoadResult, RetryPolicy,
};

/// One raw catalog row: column name to cell text.
pub type RawRow = HashMap<String, String>;

/// Column names read from the catalog header.
pub mod fields {
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const Z: &str = "z";
    pub const COLOR_INDEX: &str = "ci";
    pub const MAGNITUDE: &str = "mag";
    pub const DISTANCE: &str = "dist";
    pub const PROPER: &str = "proper";
    pub const BAYER: &str = "bayer";
    pub const GLIESE: &str = "gl";
    pub const HD: &str = "hd";
    pub const HIP: &str = "hip";
    pub const SPECTRAL_TYPE: &str = "spect";
    pub const CONSTELLATION: &str = "con";
    pub const RIGHT_ASCENSION: &str = "ra";
    pub const DECLINATION: &str = "dec";
}

/// Placeholder shown for absent descriptive fields.
pub const PLACEHOLDER: &str = "—";

/// A single catalog star.
///
/// Only `position` participates in geometry; every other field is used for
/// display and search and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    /// Cartesian position in catalog units (parsecs for HYG)
    pub position: [f64; 3],
    /// B-V color index
    pub color_index: Option<f64>,
    /// Apparent visual magnitude
    pub magnitude: Option<f64>,
    /// Distance from the Sun in catalog units
    pub distance: Option<f64>,
    pub proper_name: Option<String>,
    pub bayer_designation: Option<String>,
    pub gliese_id: Option<String>,
    pub hd_id: Option<u32>,
    pub hipparcos_id: Option<u32>,
    pub spectral_type: Option<String>,
    pub constellation: Option<String>,
    /// Right ascension in hours
    pub right_ascension: Option<f64>,
    /// Declination in degrees
    pub declination: Option<f64>,
}

impl StarRecord {
    /// Create a record with only a position; descriptive fields start absent.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            color_index: None,
            magnitude: None,
            distance: None,
            proper_name: None,
            bayer_designation: None,
            gliese_id: None,
            hd_id: None,
            hipparcos_id: None,
            spectral_type: None,
            constellation: None,
            right_ascension: None,
            declination: None,
        }
    }

    /// Best available human-readable name.
    ///
    /// Falls back through proper name, Bayer designation, Gliese id, HD and
    /// Hipparcos numbers.
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .proper_name
            .as_ref()
            .or(self.bayer_designation.as_ref())
            .or(self.gliese_id.as_ref())
        {
            return name.clone();
        }
        if let Some(hd) = self.hd_id {
            return format!("HD {hd}");
        }
        if let Some(hip) = self.hipparcos_id {
            return format!("HIP {hip}");
        }
        "Unnamed star".to_string()
    }

    /// Ordered label/value pairs for a read-only detail panel.
    ///
    /// Absent values render as [`PLACEHOLDER`].
    pub fn detail_fields(&self) -> Vec<(&'static str, String)> {
        fn text(value: &Option<String>) -> String {
            value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
        }
        fn number(value: Option<f64>, precision: usize) -> String {
            value
                .map(|v| format!("{v:.precision$}"))
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        }
        fn id(value: Option<u32>) -> String {
            value
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        }

        let [x, y, z] = self.position;
        vec![
            ("Name", self.display_name()),
            ("Proper name", text(&self.proper_name)),
            ("Bayer", text(&self.bayer_designation)),
            ("Gliese", text(&self.gliese_id)),
            ("HD", id(self.hd_id)),
            ("HIP", id(self.hipparcos_id)),
            ("Spectral type", text(&self.spectral_type)),
            ("Constellation", text(&self.constellation)),
            ("Magnitude", number(self.magnitude, 2)),
            ("Distance", number(self.distance, 2)),
            ("Color index (B-V)", number(self.color_index, 3)),
            ("RA (h)", number(self.right_ascension, 4)),
            ("Dec (deg)", number(self.declination, 4)),
            ("Position", format!("({x:.3}, {y:.3}, {z:.3})")),
        ]
    }
}

/// Counts from a normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Cell text for a column, treating empty cells as absent.
fn cell<'a>(row: &'a RawRow, name: &str) -> Option<&'a str> {
    row.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn number_field(row: &RawRow, name: &str) -> Option<f64> {
    cell(row, name).and_then(finite)
}

fn text_field(row: &RawRow, name: &str) -> Option<String> {
    cell(row, name).map(str::to_string)
}

fn id_field(row: &RawRow, name: &str) -> Option<u32> {
    cell(row, name).and_then(|s| s.parse::<u32>().ok())
}

/// Normalize one raw row, or `None` if it has no usable position.
///
/// All three coordinates must be present, but only `x` is checked for being
/// numeric: an unparseable `y` or `z` is kept and surfaces as NaN in the
/// position. Downstream geometry skips non-finite points.
pub fn normalize_row(row: &RawRow) -> Option<StarRecord> {
    let x_text = cell(row, fields::X)?;
    let y_text = cell(row, fields::Y)?;
    let z_text = cell(row, fields::Z)?;

    let x = finite(x_text)?;
    let y = y_text.parse::<f64>().unwrap_or(f64::NAN);
    let z = z_text.parse::<f64>().unwrap_or(f64::NAN);

    Some(StarRecord {
        position: [x, y, z],
        color_index: number_field(row, fields::COLOR_INDEX),
        magnitude: number_field(row, fields::MAGNITUDE),
        distance: number_field(row, fields::DISTANCE),
        proper_name: text_field(row, fields::PROPER),
        bayer_designation: text_field(row, fields::BAYER),
        gliese_id: text_field(row, fields::GLIESE),
        hd_id: id_field(row, fields::HD),
        hipparcos_id: id_field(row, fields::HIP),
        spectral_type: text_field(row, fields::SPECTRAL_TYPE),
        constellation: text_field(row, fields::CONSTELLATION),
        right_ascension: number_field(row, fields::RIGHT_ASCENSION),
        declination: number_field(row, fields::DECLINATION),
    })
}

/// Normalize a sequence of raw rows, preserving order and dropping rows
/// without a usable position.
pub fn normalize_rows<'a, I>(rows: I) -> (Vec<StarRecord>, NormalizeReport)
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut report = NormalizeReport::default();
    let mut records = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        match normalize_row(row) {
            Some(record) => {
                report.accepted += 1;
                records.push(record);
            }
            None => {
                report.rejected += 1;
                log::trace!("Discarding catalog row {i}: missing or non-numeric coordinates");
            }
        }
    }

    log::info!(
        "Normalized catalog: {} stars accepted, {} rows rejected",
        report.accepted,
        report.rejected
    );

    (records, report)
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An immutable, shareable set of loaded stars.
///
/// Each catalog gets a unique generation number so derived views (filter
/// caches, point clouds) can tell two loads apart without comparing records.
#[derive(Debug, Clone)]
pub struct Catalog {
    stars: Arc<[StarRecord]>,
    generation: u64,
}

impl Catalog {
    pub fn new(stars: Vec<StarRecord>) -> Self {
        Self {
            stars: stars.into(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Normalize raw rows straight into a catalog.
    pub fn from_rows<'a, I>(rows: I) -> (Self, NormalizeReport)
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let (records, report) = normalize_rows(rows);
        (Self::new(records), report)
    }

    /// Get a star by its position in the catalog
    pub fn get_star(&self, index: usize) -> Option<&StarRecord> {
        self.stars.get(index)
    }

    /// All stars in catalog order
    pub fn stars(&self) -> &[StarRecord] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

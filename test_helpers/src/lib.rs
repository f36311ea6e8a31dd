//! Shared testing infrastructure for the star map workspace.
//!
//! Deterministic synthetic star catalogs sized like real ones (tens of
//! thousands of sparse rows) for integration tests and benchmarks.
//!
//! # Usage Examples
//!
//! ```rust
//! use test_helpers::{synthetic_catalog_csv, synthetic_rows};
//!
//! // Same seed, same catalog
//! let a = synthetic_rows(100, 7);
//! let b = synthetic_rows(100, 7);
//! assert_eq!(a, b);
//!
//! let csv = synthetic_catalog_csv(10, 7);
//! assert!(csv.starts_with("id,x,y,z,"));
//! ```

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Catalog columns written by the synthetic generators, in order.
pub const SYNTHETIC_COLUMNS: [&str; 16] = [
    "id", "x", "y", "z", "ci", "mag", "dist", "proper", "bayer", "gl", "hd", "hip", "spect",
    "con", "ra", "dec",
];

const PROPER_NAMES: [&str; 12] = [
    "Sirius",
    "Canopus",
    "Arcturus",
    "Vega",
    "Capella",
    "Rigel",
    "Procyon",
    "Betelgeuse",
    "Altair",
    "Aldebaran",
    "Antares",
    "Spica",
];

const BAYER_LETTERS: [&str; 6] = ["Alp", "Bet", "Gam", "Del", "Eps", "Zet"];

const CONSTELLATIONS: [&str; 8] = ["Ori", "CMa", "Lyr", "Aql", "Tau", "Sco", "Vir", "Cyg"];

const SPECTRAL_CLASSES: [&str; 7] = ["O", "B", "A", "F", "G", "K", "M"];

/// Deterministic sparse catalog rows resembling the HYG database.
///
/// Roughly 1% of rows have a proper name (suffixed with the row id so names
/// stay unique), 5% a Bayer designation, 10% a Gliese id, 20% no color
/// index, and 2% lack a usable `x` coordinate.
pub fn synthetic_rows(count: usize, seed: u64) -> Vec<HashMap<String, String>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..count)
        .map(|id| {
            let mut row = HashMap::new();
            let mut put = |key: &str, value: String| {
                row.insert(key.to_string(), value);
            };

            let distance: f64 = rng.random_range(1.0..1000.0);
            let ra: f64 = rng.random_range(0.0..24.0);
            let dec: f64 = rng.random_range(-90.0_f64..90.0);
            let (ra_rad, dec_rad) = ((ra * 15.0).to_radians(), dec.to_radians());

            let x = distance * dec_rad.cos() * ra_rad.cos();
            let y = distance * dec_rad.cos() * ra_rad.sin();
            let z = distance * dec_rad.sin();

            put("id", id.to_string());
            if rng.random_bool(0.02) {
                put("x", String::new());
            } else {
                put("x", format!("{x:.6}"));
            }
            put("y", format!("{y:.6}"));
            put("z", format!("{z:.6}"));

            if rng.random_bool(0.8) {
                put("ci", format!("{:.3}", rng.random_range(-0.4..2.0)));
            } else {
                put("ci", String::new());
            }
            put("mag", format!("{:.2}", rng.random_range(-1.5..15.0)));
            put("dist", format!("{distance:.4}"));

            let proper = if rng.random_bool(0.01) {
                format!("{} {id}", PROPER_NAMES[id % PROPER_NAMES.len()])
            } else {
                String::new()
            };
            put("proper", proper);

            let bayer = if rng.random_bool(0.05) {
                BAYER_LETTERS[rng.random_range(0..BAYER_LETTERS.len())].to_string()
            } else {
                String::new()
            };
            put("bayer", bayer);

            let gliese = if rng.random_bool(0.1) {
                format!("Gl {}", rng.random_range(1..1000))
            } else {
                String::new()
            };
            put("gl", gliese);

            put("hd", rng.random_range(1..360_000u32).to_string());
            put("hip", rng.random_range(1..120_000u32).to_string());
            put(
                "spect",
                format!(
                    "{}{}V",
                    SPECTRAL_CLASSES[rng.random_range(0..SPECTRAL_CLASSES.len())],
                    rng.random_range(0..10)
                ),
            );
            put(
                "con",
                CONSTELLATIONS[rng.random_range(0..CONSTELLATIONS.len())].to_string(),
            );
            put("ra", format!("{ra:.6}"));
            put("dec", format!("{dec:.6}"));

            row
        })
        .collect()
}

/// The rows of [`synthetic_rows`] rendered as CSV text with a header row.
pub fn synthetic_catalog_csv(count: usize, seed: u64) -> String {
    let mut text = SYNTHETIC_COLUMNS.join(",");
    text.push('\n');

    for row in synthetic_rows(count, seed) {
        let line: Vec<&str> = SYNTHETIC_COLUMNS
            .iter()
            .map(|column| row.get(*column).map(String::as_str).unwrap_or(""))
            .collect();
        text.push_str(&line.join(","));
        text.push('\n');
    }

    text
}

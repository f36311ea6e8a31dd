//! Flat position/color buffers for the point cloud primitive.
//!
//! A [`PointCloud`] is rebuilt from scratch whenever the visible star set
//! changes. Buffer slot `i` (floats `3i..3i+3` in both buffers) always
//! corresponds to the `i`-th visible record; picking relies on this to map a
//! hit back to a star.

use rayon::prelude::*;

use crate::catalog::StarRecord;
use crate::color::star_color;

/// Floats per point in each buffer.
pub const COMPONENTS: usize = 3;

/// Above this many points the buffers are filled in parallel by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 20_000;

/// Render-ready buffers for one visible star set.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    positions: Vec<f32>,
    colors: Vec<f32>,
}

fn write_point(star: &StarRecord, position: &mut [f32], color: &mut [f32]) {
    for (slot, value) in position.iter_mut().zip(star.position) {
        *slot = value as f32;
    }
    color.copy_from_slice(&star_color(star.color_index).to_array());
}

impl PointCloud {
    /// Build buffers for `count` stars fetched by position.
    ///
    /// Returns `None` for an empty set: there is nothing to render and no
    /// primitive should exist.
    fn build_with<'a, F>(count: usize, star_at: F, parallel_threshold: usize) -> Option<Self>
    where
        F: Fn(usize) -> &'a StarRecord + Sync,
    {
        if count == 0 {
            return None;
        }

        let mut positions = vec![0.0_f32; count * COMPONENTS];
        let mut colors = vec![0.0_f32; count * COMPONENTS];

        if count >= parallel_threshold {
            positions
                .par_chunks_mut(COMPONENTS)
                .zip(colors.par_chunks_mut(COMPONENTS))
                .enumerate()
                .for_each(|(i, (position, color))| write_point(star_at(i), position, color));
        } else {
            positions
                .chunks_mut(COMPONENTS)
                .zip(colors.chunks_mut(COMPONENTS))
                .enumerate()
                .for_each(|(i, (position, color))| write_point(star_at(i), position, color));
        }

        Some(Self { positions, colors })
    }

    /// Build from an ordered slice of records.
    pub fn from_records(stars: &[StarRecord]) -> Option<Self> {
        Self::build_with(stars.len(), |i| &stars[i], DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Build from the subset of `stars` named by `indices`, in index-list order.
    pub fn from_selection(
        stars: &[StarRecord],
        indices: &[usize],
        parallel_threshold: usize,
    ) -> Option<Self> {
        Self::build_with(indices.len(), |i| &stars[indices[i]], parallel_threshold)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.positions.len() / COMPONENTS
    }

    /// Always false for a built cloud; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flat `[x0, y0, z0, x1, ...]` buffer.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat `[r0, g0, b0, r1, ...]` buffer.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        let start = index.checked_mul(COMPONENTS)?;
        let slice = self.positions.get(start..start + COMPONENTS)?;
        Some([slice[0], slice[1], slice[2]])
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        let start = index.checked_mul(COMPONENTS)?;
        let slice = self.colors.get(start..start + COMPONENTS)?;
        Some([slice[0], slice[1], slice[2]])
    }
}

//! Reflectivity field synthesis.
//!
//! One deterministic function of position and model state, evaluated by two
//! independent paths: a parallel rasterizer (`raster`) and a sequential point
//! sampler (`sequential`). Both read the same `ReflectivityUniforms` and the same
//! `f32` primitives, and must agree bit for bit.

pub mod primitives;
pub mod raster;
pub mod sequential;
pub mod uniforms;

use tracing::warn;

use crate::field::raster::{rasterize, RasterGrid};
use crate::field::sequential::SequentialSampler;
use crate::field::uniforms::ReflectivityUniforms;

/// Upper bound of the field, dBZ.
pub const MAX_DBZ: f32 = 75.0;

/// Outcome of evaluating a grid with both paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ParityReport {
    pub samples: usize,
    pub mismatches: usize,
    pub max_abs_diff: f32,
    /// (col, row) of the first differing pixel
    pub first_mismatch: Option<(usize, usize)>,
}

impl ParityReport {
    pub fn is_exact(&self) -> bool {
        self.mismatches == 0
    }
}

/// Render a grid with both evaluators and compare bit patterns.
pub fn compare_paths(uniforms: &ReflectivityUniforms, grid: &RasterGrid) -> ParityReport {
    let parallel = rasterize(uniforms, grid);
    let sequential = SequentialSampler::new(uniforms).sample_grid(grid);

    let mut report = ParityReport {
        samples: parallel.len(),
        mismatches: 0,
        max_abs_diff: 0.0,
        first_mismatch: None,
    };
    for (idx, (a, b)) in parallel.iter().zip(&sequential).enumerate() {
        if a.to_bits() != b.to_bits() {
            report.mismatches += 1;
            report.max_abs_diff = report.max_abs_diff.max((a - b).abs());
            report
                .first_mismatch
                .get_or_insert((idx % grid.width, idx / grid.width));
        }
    }
    if !report.is_exact() {
        warn!(
            mismatches = report.mismatches,
            max_abs_diff = report.max_abs_diff,
            "Reflectivity paths disagree"
        );
    }
    report
}

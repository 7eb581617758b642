//! Parallel rasterizer: one independent lane per pixel.
//!
//! Each lane reads only the uniforms and its own pixel centre. No lane writes
//! anything but its own output slot.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::field::primitives::{clamp, fbm2, fbm3, mix, shortest_lon_delta, smoothstep};
use crate::field::uniforms::{FieldDomain, ReflectivityUniforms};
use crate::field::MAX_DBZ;

/// Pixel layout over a domain. Row 0 is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub domain: FieldDomain,
    pub width: usize,
    pub height: usize,
}

impl RasterGrid {
    pub fn new(domain: FieldDomain, width: usize, height: usize) -> Self {
        Self {
            domain,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Centre of a pixel as (lon, lat). Both evaluators use this.
    pub fn cell_center(&self, col: usize, row: usize) -> (f32, f32) {
        let dlon = self.domain.width_deg() / self.width as f64;
        let dlat = self.domain.height_deg() / self.height as f64;
        let lon = self.domain.lon_min + (col as f64 + 0.5) * dlon;
        let lat = self.domain.lat_max - (row as f64 + 0.5) * dlat;
        (lon as f32, lat as f32)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render the whole grid in parallel, row-major.
pub fn rasterize(uniforms: &ReflectivityUniforms, grid: &RasterGrid) -> Vec<f32> {
    let mut pixels = vec![0.0_f32; grid.len()];
    pixels
        .par_chunks_mut(grid.width)
        .enumerate()
        .for_each(|(row, line)| {
            line.par_iter_mut().enumerate().for_each(|(col, pixel)| {
                let (lon, lat) = grid.cell_center(col, row);
                *pixel = shade(uniforms, lon, lat);
            });
        });
    pixels
}

/// Per-lane kernel.
pub fn shade(u: &ReflectivityUniforms, lon: f32, lat: f32) -> f32 {
    let t = u.time_hours;

    // === TEXTURE FETCH ===
    let hx = u.elevation.lon_step;
    let hy = u.elevation.lat_step;
    let grad_x = (u.elevation.sample(lon + hx, lat) - u.elevation.sample(lon - hx, lat)) / (2.0 * hx);
    let grad_y = (u.elevation.sample(lon, lat + hy) - u.elevation.sample(lon, lat - hy)) / (2.0 * hy);
    let wind_u = u.wind_u.sample(lon, lat);
    let wind_v = u.wind_v.sample(lon, lat);
    let humidity = u.humidity.sample(lon, lat);
    let wind_speed = (wind_u * wind_u + wind_v * wind_v).sqrt();

    // === OROGRAPHIC ===
    let mut orographic = 0.0_f32;
    if wind_speed > 12.0 {
        let upslope = wind_u * grad_x + wind_v * grad_y;
        if upslope > 0.0 {
            orographic = (upslope * 0.004).min(40.0) * humidity / 100.0;
        }
    }

    // === CYCLONE ===
    let mut storm = 0.0_f32;
    if let Some(c) = &u.cyclone {
        let dx = shortest_lon_delta(lon, c.lon) * c.cos_lat;
        let dy = lat - c.lat;
        let r = (dx * dx + dy * dy).sqrt();
        let theta = (dy * c.hemisphere).atan2(dx);
        let azimuth = dy.atan2(dx);
        let rn = r / c.rmw_deg.max(0.05);
        let org = c.organisation;

        let phase = 2.0 * (theta - 2.5 * r.max(0.01).ln() + 0.1 * t);
        let arm = 0.5 + 0.5 * phase.cos();
        let grain = fbm2(dx * 3.0 + 0.02 * t, dy * 3.0, u.seed + 3.0);
        let bands = arm * arm * arm * (0.4 + 0.6 * grain) * smoothstep(1.0, 1.8, rn);

        let ring = (1.0 - (rn - 1.0).abs() / 0.35).max(0.0);
        let eyewall = ring * ring;
        let moat = smoothstep(1.3, 1.6, rn) * (1.0 - smoothstep(2.2, 2.8, rn));
        let suppression = 1.0 - 0.8 * moat * org;

        let comma = (-0.5 * rn).exp() * (0.5 + 0.5 * (azimuth - c.shear_dir).cos());
        let mut core = mix(comma, eyewall, org);
        if org < 0.35 {
            let chaos = fbm2(dx * 8.0 + 0.05 * t, dy * 8.0, u.seed + 7.0) * (-0.5 * rn).exp();
            core = mix(core, chaos, (0.35 - org) / 0.35);
        }

        let fade = 1.0 - smoothstep(0.6 * c.outer_deg, c.outer_deg, r);
        let asymmetry = 0.75 + 0.25 * (azimuth - c.heading).cos();
        let raw = (55.0 * core + 40.0 * bands * asymmetry) * fade * suppression;
        let ceiling = 75.0 * clamp((humidity - 20.0) / 60.0, 0.3, 1.0);
        storm = raw.min(ceiling);
    }

    // === AMBIENT CONVECTION ===
    let ax = lon - wind_u * u.advection;
    let ay = lat - wind_v * u.advection;
    let n1 = fbm2(ax * 0.8, ay * 0.8, u.seed);
    let n2 = fbm3(ax * 3.0 + 0.05 * t, ay * 3.0, u.seed + 11.0);
    let cell = 0.6 * n1 + 0.4 * n2;
    let cutoff = 0.75 - 0.2 * humidity / 100.0;
    let mut convection = 0.0_f32;
    if cell > cutoff {
        convection = (cell - cutoff) / (1.0 - cutoff) * 50.0;
    }

    clamp(orographic.max(storm).max(convection), 0.0, MAX_DBZ)
}

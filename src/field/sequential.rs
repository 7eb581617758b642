//! Point-at-a-time evaluator for tooltips, spot checks and cross-checking the rasterizer.

use crate::field::primitives::{clamp, fbm2, fbm3, mix, shortest_lon_delta, smoothstep};
use crate::field::raster::RasterGrid;
use crate::field::uniforms::{CycloneUniforms, ReflectivityUniforms};
use crate::field::MAX_DBZ;

/// Environment values fetched once per point.
#[derive(Debug, Clone, Copy)]
struct LocalSample {
    lon: f32,
    lat: f32,
    grad_x: f32,
    grad_y: f32,
    wind_u: f32,
    wind_v: f32,
    humidity: f32,
}

/// Storm-relative coordinates of a point.
#[derive(Debug, Clone, Copy)]
struct Polar {
    dx: f32,
    dy: f32,
    r: f32,
    /// Hemisphere-mirrored angle for the spiral
    theta: f32,
    /// Unmirrored angle for asymmetries
    azimuth: f32,
    rn: f32,
}

/// Evaluates the field one point at a time from the same uniforms as the rasterizer.
///
/// Only points inside the domain the uniforms were built for are meaningful. The
/// environment textures clamp to their edge texel, so a point outside the domain
/// silently reads the nearest edge values.
pub struct SequentialSampler<'a> {
    uniforms: &'a ReflectivityUniforms,
}

impl<'a> SequentialSampler<'a> {
    pub fn new(uniforms: &'a ReflectivityUniforms) -> Self {
        Self { uniforms }
    }

    pub fn reflectivity_at(&self, lon: f32, lat: f32) -> f32 {
        let local = self.fetch(lon, lat);
        let orographic = self.orographic(&local);
        let storm = match &self.uniforms.cyclone {
            Some(c) => self.cyclone_structure(c, &local),
            None => 0.0,
        };
        let convection = self.ambient_convection(&local);
        clamp(orographic.max(storm).max(convection), 0.0, MAX_DBZ)
    }

    /// Evaluate every pixel of a grid in order.
    pub fn sample_grid(&self, grid: &RasterGrid) -> Vec<f32> {
        let mut out = Vec::with_capacity(grid.len());
        for row in 0..grid.height {
            for col in 0..grid.width {
                let (lon, lat) = grid.cell_center(col, row);
                out.push(self.reflectivity_at(lon, lat));
            }
        }
        out
    }

    fn fetch(&self, lon: f32, lat: f32) -> LocalSample {
        let u = self.uniforms;
        let elevation = &u.elevation;
        let east = elevation.sample(lon + elevation.lon_step, lat);
        let west = elevation.sample(lon - elevation.lon_step, lat);
        let north = elevation.sample(lon, lat + elevation.lat_step);
        let south = elevation.sample(lon, lat - elevation.lat_step);
        LocalSample {
            lon,
            lat,
            grad_x: (east - west) / (2.0 * elevation.lon_step),
            grad_y: (north - south) / (2.0 * elevation.lat_step),
            wind_u: u.wind_u.sample(lon, lat),
            wind_v: u.wind_v.sample(lon, lat),
            humidity: u.humidity.sample(lon, lat),
        }
    }

    fn orographic(&self, s: &LocalSample) -> f32 {
        let speed = (s.wind_u * s.wind_u + s.wind_v * s.wind_v).sqrt();
        if speed <= 12.0 {
            return 0.0;
        }
        let upslope = s.wind_u * s.grad_x + s.wind_v * s.grad_y;
        if upslope <= 0.0 {
            return 0.0;
        }
        (upslope * 0.004).min(40.0) * s.humidity / 100.0
    }

    fn polar(c: &CycloneUniforms, s: &LocalSample) -> Polar {
        let dx = shortest_lon_delta(s.lon, c.lon) * c.cos_lat;
        let dy = s.lat - c.lat;
        let r = (dx * dx + dy * dy).sqrt();
        Polar {
            dx,
            dy,
            r,
            theta: (dy * c.hemisphere).atan2(dx),
            azimuth: dy.atan2(dx),
            rn: r / c.rmw_deg.max(0.05),
        }
    }

    fn rainbands(&self, p: &Polar) -> f32 {
        let t = self.uniforms.time_hours;
        let phase = 2.0 * (p.theta - 2.5 * p.r.max(0.01).ln() + 0.1 * t);
        let arm = 0.5 + 0.5 * phase.cos();
        let grain = fbm2(p.dx * 3.0 + 0.02 * t, p.dy * 3.0, self.uniforms.seed + 3.0);
        arm * arm * arm * (0.4 + 0.6 * grain) * smoothstep(1.0, 1.8, p.rn)
    }

    fn core(&self, c: &CycloneUniforms, p: &Polar) -> f32 {
        let org = c.organisation;
        let ring = (1.0 - (p.rn - 1.0).abs() / 0.35).max(0.0);
        let eyewall = ring * ring;
        let comma = (-0.5 * p.rn).exp() * (0.5 + 0.5 * (p.azimuth - c.shear_dir).cos());
        let blended = mix(comma, eyewall, org);
        if org >= 0.35 {
            return blended;
        }
        let t = self.uniforms.time_hours;
        let chaos = fbm2(p.dx * 8.0 + 0.05 * t, p.dy * 8.0, self.uniforms.seed + 7.0) * (-0.5 * p.rn).exp();
        mix(blended, chaos, (0.35 - org) / 0.35)
    }

    fn cyclone_structure(&self, c: &CycloneUniforms, s: &LocalSample) -> f32 {
        let p = Self::polar(c, s);
        let bands = self.rainbands(&p);
        let moat = smoothstep(1.3, 1.6, p.rn) * (1.0 - smoothstep(2.2, 2.8, p.rn));
        let suppression = 1.0 - 0.8 * moat * c.organisation;
        let core = self.core(c, &p);
        let fade = 1.0 - smoothstep(0.6 * c.outer_deg, c.outer_deg, p.r);
        let asymmetry = 0.75 + 0.25 * (p.azimuth - c.heading).cos();
        let raw = (55.0 * core + 40.0 * bands * asymmetry) * fade * suppression;
        raw.min(75.0 * clamp((s.humidity - 20.0) / 60.0, 0.3, 1.0))
    }

    fn ambient_convection(&self, s: &LocalSample) -> f32 {
        let u = self.uniforms;
        let t = u.time_hours;
        let ax = s.lon - s.wind_u * u.advection;
        let ay = s.lat - s.wind_v * u.advection;
        let cell = 0.6 * fbm2(ax * 0.8, ay * 0.8, u.seed) + 0.4 * fbm3(ax * 3.0 + 0.05 * t, ay * 3.0, u.seed + 11.0);
        let cutoff = 0.75 - 0.2 * s.humidity / 100.0;
        if cell > cutoff {
            (cell - cutoff) / (1.0 - cutoff) * 50.0
        } else {
            0.0
        }
    }
}

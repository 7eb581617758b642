//! Plain-data inputs shared by both reflectivity evaluators.
//!
//! Everything the field needs is captured here once per frame as `f32` scalars and
//! small textures, so the evaluators never touch the live simulation state.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::field::primitives::{clamp, mix};
use crate::simulation::sphere_math::{normalize_lon, KM_PER_DEGREE};
use crate::simulation::steering::{layer_wind, steering, WindVector};
use crate::simulation::wind_radii::radius_of_maximum_wind;
use crate::simulation::SimulationContext;
use crate::world::cyclone::{CycloneState, EyewallCycle};
use crate::world::environment::Environment;
use crate::world::pressure_cells::Layer;

/// Default texel count per side for environment textures.
pub const TEXTURE_SIZE: usize = 64;

/// Geographic window of a render. Longitudes may run past 180 to cross the date line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDomain {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl FieldDomain {
    /// Square window of `half_width_deg` around a point, latitude clipped to +-89.
    pub fn centered(lon: f64, lat: f64, half_width_deg: f64) -> Self {
        Self {
            lon_min: lon - half_width_deg,
            lon_max: lon + half_width_deg,
            lat_min: (lat - half_width_deg).max(-89.0),
            lat_max: (lat + half_width_deg).min(89.0),
        }
    }

    pub fn width_deg(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height_deg(&self) -> f64 {
        self.lat_max - self.lat_min
    }
}

/// A regular lon/lat grid of samples with texels on the grid corners.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTexture {
    pub width: usize,
    pub height: usize,
    pub lon_min: f32,
    pub lat_min: f32,
    pub lon_step: f32,
    pub lat_step: f32,
    /// Row-major, row 0 at `lat_min`
    pub data: Vec<f32>,
}

impl FieldTexture {
    /// Sample `f(lon, lat)` over the domain. At least 2x2 texels.
    pub fn from_fn<F>(domain: &FieldDomain, width: usize, height: usize, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        let width = width.max(2);
        let height = height.max(2);
        let lon_step = domain.width_deg() / (width - 1) as f64;
        let lat_step = domain.height_deg() / (height - 1) as f64;
        let data = (0..width * height)
            .into_par_iter()
            .map(|idx| {
                let lon = domain.lon_min + (idx % width) as f64 * lon_step;
                let lat = domain.lat_min + (idx / width) as f64 * lat_step;
                f(lon, lat) as f32
            })
            .collect();
        Self {
            width,
            height,
            lon_min: domain.lon_min as f32,
            lat_min: domain.lat_min as f32,
            lon_step: lon_step as f32,
            lat_step: lat_step as f32,
            data,
        }
    }

    /// Same value everywhere.
    pub fn constant(domain: &FieldDomain, value: f32) -> Self {
        Self::from_fn(domain, 2, 2, |_, _| value as f64)
    }

    fn texel(&self, i: usize, j: usize) -> f32 {
        self.data[j * self.width + i]
    }

    /// Bilinear sample, clamped to the texture edge.
    pub fn sample(&self, lon: f32, lat: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let fx = clamp((lon - self.lon_min) / self.lon_step, 0.0, max_x);
        let fy = clamp((lat - self.lat_min) / self.lat_step, 0.0, max_y);
        let i0 = (fx.floor() as usize).min(self.width - 2);
        let j0 = (fy.floor() as usize).min(self.height - 2);
        let tx = fx - i0 as f32;
        let ty = fy - j0 as f32;

        let bottom = mix(self.texel(i0, j0), self.texel(i0 + 1, j0), tx);
        let top = mix(self.texel(i0, j0 + 1), self.texel(i0 + 1, j0 + 1), tx);
        mix(bottom, top, ty)
    }
}

/// Storm parameters in render units (degrees, radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycloneUniforms {
    pub lon: f32,
    pub lat: f32,
    pub cos_lat: f32,
    /// +1 north, -1 south; mirrors the spiral
    pub hemisphere: f32,
    pub rmw_deg: f32,
    pub outer_deg: f32,
    /// 0 = ragged, 1 = clean eyewall and moat
    pub organisation: f32,
    /// Direction of motion as a math angle (counter-clockwise from east)
    pub heading: f32,
    /// Direction of the shear vector as a math angle
    pub shear_dir: f32,
}

/// Structural organisation from intensity and regime flags.
pub fn organisation(storm: &CycloneState) -> f64 {
    let mut org = ((storm.intensity - 25.0) / 75.0).clamp(0.0, 1.0);
    if storm.is_extratropical() {
        org *= 0.4;
    }
    if storm.is_subtropical() || storm.is_monsoon_depression() {
        org *= 0.6;
    }
    if matches!(storm.eyewall_cycle, EyewallCycle::Weakening { .. }) {
        org *= 0.75;
    }
    org
}

fn math_angle(v: WindVector) -> f64 {
    v.y.atan2(v.x)
}

impl CycloneUniforms {
    pub fn from_state(storm: &CycloneState, ctx: &SimulationContext) -> Self {
        let rmw_km = radius_of_maximum_wind(storm.size_km, storm.intensity);
        let shear = steering(&ctx.pressure, storm.lon, storm.lat, WindVector::ZERO).shear;
        Self {
            lon: storm.lon as f32,
            lat: storm.lat as f32,
            cos_lat: storm.lat.to_radians().cos().max(0.05) as f32,
            hemisphere: storm.hemisphere() as f32,
            rmw_deg: (rmw_km / KM_PER_DEGREE) as f32,
            outer_deg: (storm.size_km / KM_PER_DEGREE) as f32,
            organisation: organisation(storm) as f32,
            heading: (90.0 - storm.heading).to_radians() as f32,
            shear_dir: math_angle(shear) as f32,
        }
    }
}

/// Every input to the reflectivity field for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectivityUniforms {
    pub time_hours: f32,
    /// Degrees of advection per km/h of wind at `time_hours`
    pub advection: f32,
    pub seed: f32,
    pub cyclone: Option<CycloneUniforms>,
    /// Metres
    pub elevation: FieldTexture,
    /// Percent
    pub humidity: FieldTexture,
    /// Lower-layer wind, km/h
    pub wind_u: FieldTexture,
    pub wind_v: FieldTexture,
}

impl ReflectivityUniforms {
    pub fn build(ctx: &SimulationContext, environment: &Environment, domain: &FieldDomain, seed: u32) -> Self {
        Self::build_with_resolution(ctx, environment, domain, seed, TEXTURE_SIZE)
    }

    pub fn build_with_resolution(
        ctx: &SimulationContext,
        environment: &Environment,
        domain: &FieldDomain,
        seed: u32,
        texels: usize,
    ) -> Self {
        let settings = ctx.settings;
        let storm = ctx.cyclone.as_ref().filter(|c| c.is_active());
        let time_hours = ctx.hours();

        let elevation = FieldTexture::from_fn(domain, texels, texels, |lon, lat| {
            environment.elevation_at(normalize_lon(lon), lat)
        });
        let humidity = FieldTexture::from_fn(domain, texels, texels, |lon, lat| {
            environment.humidity(
                normalize_lon(lon),
                lat,
                &ctx.pressure,
                settings.month,
                storm,
                settings.global_temperature_k,
            )
        });
        let wind_u = FieldTexture::from_fn(domain, texels, texels, |lon, lat| {
            layer_wind(&ctx.pressure, lon, lat, Layer::Lower).x
        });
        let wind_v = FieldTexture::from_fn(domain, texels, texels, |lon, lat| {
            layer_wind(&ctx.pressure, lon, lat, Layer::Lower).y
        });

        Self {
            time_hours: time_hours as f32,
            advection: (time_hours / KM_PER_DEGREE) as f32,
            seed: (seed % 1000) as f32,
            cyclone: storm.map(|s| CycloneUniforms::from_state(s, ctx)),
            elevation,
            humidity,
            wind_u,
            wind_v,
        }
    }
}

//! Parametric wind profile, quadrant wind radii and central pressure.

use crate::simulation::steering::KMH_PER_KT;
use crate::world::cyclone::{CycloneState, Quadrant, WindRadii, RADII_THRESHOLDS_KT};

pub const RMW_MIN_KM: f64 = 10.0;
pub const RMW_MAX_KM: f64 = 150.0;
const AZIMUTH_STEP_DEG: f64 = 15.0;
const RADIAL_STEP_KM: f64 = 10.0;
pub const MAX_SEARCH_KM: f64 = 1000.0;

pub fn radius_of_maximum_wind(size_km: f64, intensity: f64) -> f64 {
    (size_km * 0.15 * (1.0 - intensity / 250.0)).clamp(RMW_MIN_KM, RMW_MAX_KM)
}

/// Decay exponent of the outer profile. Extratropical storms have a flatter,
/// broader wind field.
pub fn profile_exponent(size_km: f64, extratropical: bool) -> f64 {
    if extratropical {
        0.35
    } else {
        (0.65 - size_km / 2000.0).clamp(0.3, 0.6)
    }
}

/// Inputs for sampling the surface wind field of one storm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindProfile {
    pub vortex_max: f64,
    pub rmw: f64,
    pub exponent: f64,
    pub translation_kt: f64,
    /// Bearing of strongest translational enhancement
    pub asymmetry_bearing: f64,
}

impl WindProfile {
    pub fn for_storm(state: &CycloneState) -> Self {
        let v = state.intensity;
        let translation_kt = state.speed / KMH_PER_KT;
        Self {
            vortex_max: (v - 0.5 * translation_kt).max(0.6 * v),
            rmw: radius_of_maximum_wind(state.size_km, v),
            exponent: profile_exponent(state.size_km, state.is_extratropical()),
            translation_kt,
            asymmetry_bearing: state.heading + 90.0 * state.hemisphere(),
        }
    }

    /// Symmetric vortex wind in knots at radius `r_km`.
    pub fn vortex_wind(&self, r_km: f64) -> f64 {
        if r_km < self.rmw {
            self.vortex_max * r_km / self.rmw
        } else {
            self.vortex_max * (self.rmw / r_km).powf(self.exponent)
        }
    }

    /// Total wind in knots at a radius and bearing from the centre.
    pub fn wind_at(&self, r_km: f64, azimuth_deg: f64) -> f64 {
        let asymmetry = 0.5 * self.translation_kt * (azimuth_deg - self.asymmetry_bearing).to_radians().cos();
        self.vortex_wind(r_km) + asymmetry
    }

    /// Outermost radius along one bearing where the wind still reaches `threshold`.
    fn search(&self, azimuth_deg: f64, threshold: f64) -> f64 {
        let mut r = self.rmw;
        if self.wind_at(r, azimuth_deg) < threshold {
            return 0.0;
        }
        loop {
            let next = r + RADIAL_STEP_KM;
            if next > MAX_SEARCH_KM {
                return MAX_SEARCH_KM;
            }
            if self.wind_at(next, azimuth_deg) < threshold {
                return r;
            }
            r = next;
        }
    }

    pub fn quadrant_radius(&self, quadrant: Quadrant, threshold: f64) -> f64 {
        let steps = (90.0 / AZIMUTH_STEP_DEG) as usize;
        (0..steps)
            .map(|i| quadrant.start_bearing() + AZIMUTH_STEP_DEG * 0.5 + AZIMUTH_STEP_DEG * i as f64)
            .map(|az| self.search(az, threshold))
            .fold(0.0, f64::max)
    }
}

pub fn measure_wind_radii(state: &CycloneState) -> WindRadii {
    let profile = WindProfile::for_storm(state);
    let mut radii = WindRadii::default();
    for (t, threshold) in RADII_THRESHOLDS_KT.iter().enumerate() {
        for quadrant in Quadrant::all() {
            radii.radii[t][quadrant.index()] = profile.quadrant_radius(*quadrant, *threshold);
        }
    }
    radii
}

/// Minimum sea-level pressure in hPa from intensity and the surrounding pressure.
pub fn central_pressure(intensity: f64, environment_hpa: f64) -> f64 {
    1010.0 + 0.3 * (environment_hpa - 1013.0) - (intensity.max(0.0) / 6.7).powf(1.0 / 0.644)
}

//! Intensity change under the competing regimes a storm can be in.
//!
//! Exactly one regime applies per step, chosen in priority order: terrain, land,
//! near land, extratropical, open ocean.

use tracing::debug;

use crate::simulation::rng::SimRng;
use crate::world::cyclone::{CycloneState, ExtratropicalStage, EyewallCycle};
use crate::world::environment::LandStatus;
use crate::world::names::Basin;

/// Below this a storm over raised terrain is treated by the plain land branch.
pub const TERRAIN_MIN_INTENSITY: f64 = 20.0;
const TERRAIN_ELEVATION_CAP_M: f64 = 3000.0;

pub const ERC_MIN_INTENSITY: f64 = 100.0;
const ERC_PROBABILITY: f64 = 0.04;
const ERC_PHASE_HOURS: (f64, f64) = (12.0, 24.0);

pub const SUBTROPICAL_CAP_KT: f64 = 60.0;
const MONSOON_RATE_FACTOR: f64 = 0.4;
const SUBTROPICAL_RATE_FACTOR: f64 = 0.5;

pub const SHEAR_THRESHOLD_KT: f64 = 10.0;
const SHEAR_PENALTY_PER_KT: f64 = 0.25;
const DRY_AIR_THRESHOLD: f64 = 60.0;
const DRY_AIR_MAX_PENALTY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityRegime {
    Terrain,
    Land,
    NearLand,
    Extratropical,
    OpenOcean,
}

impl IntensityRegime {
    pub fn classify(state: &CycloneState, elevation: f64, land: LandStatus) -> IntensityRegime {
        if elevation > 0.0 && state.intensity > TERRAIN_MIN_INTENSITY {
            IntensityRegime::Terrain
        } else if land.is_land {
            IntensityRegime::Land
        } else if land.is_near_land {
            IntensityRegime::NearLand
        } else if state.is_extratropical() {
            IntensityRegime::Extratropical
        } else {
            IntensityRegime::OpenOcean
        }
    }
}

/// What the storm sees around it this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConditions {
    pub sst: f64,
    pub land: LandStatus,
    pub elevation: f64,
    /// Effective shear in knots, all corrections included
    pub shear_kt: f64,
    /// Mean humidity on the ring at the circulation radius
    pub ring_humidity: f64,
}

/// Maximum potential intensity in knots for a sea-surface temperature.
pub fn potential_intensity(sst: f64) -> f64 {
    let mpi = 1.944 * (28.2 + 55.8 * (0.1813 * (sst - 30.0)).exp());
    mpi * ((sst - 20.0) / 6.0).clamp(0.0, 1.0)
}

/// Scales the intensification cap: weak near the equator, full in the deep tropics,
/// fading toward the mid-latitudes.
pub fn latitude_factor(lat: f64) -> f64 {
    let abs_lat = lat.abs();
    if abs_lat < 5.0 {
        0.4
    } else if abs_lat <= 25.0 {
        1.0
    } else if abs_lat >= 40.0 {
        0.3
    } else {
        1.0 - 0.7 * (abs_lat - 25.0) / 15.0
    }
}

/// Total shear felt by the storm in knots.
pub fn effective_shear_kt(shear_kmh: f64, shear_scale: f64, event_kt: f64, basin: Basin, month: u32) -> f64 {
    shear_kmh / 1.852 * shear_scale + event_kt + basin.shear_correction() + basin.seasonal_shear_correction(month)
}

pub fn shear_penalty(shear_kt: f64) -> f64 {
    (shear_kt - SHEAR_THRESHOLD_KT).max(0.0) * SHEAR_PENALTY_PER_KT
}

/// Small storms are more sensitive to dry air than large ones.
pub fn dry_air_penalty(ring_humidity: f64, size_km: f64) -> f64 {
    let dryness = (DRY_AIR_THRESHOLD - ring_humidity).max(0.0) / DRY_AIR_THRESHOLD;
    let sensitivity = (300.0 / size_km.max(1.0)).clamp(0.5, 2.0);
    dryness * DRY_AIR_MAX_PENALTY * sensitivity
}

/// Circulation size the storm relaxes toward at a given intensity.
pub fn equilibrium_size(intensity: f64) -> f64 {
    (420.0 - 1.5 * intensity).clamp(150.0, 600.0)
}

/// Apply one step of the chosen regime. Returns the raw (unfloored) intensity and
/// updates size and the eyewall cycle in place.
pub fn apply_regime(
    state: &mut CycloneState,
    regime: IntensityRegime,
    conditions: &LocalConditions,
    rng: &mut SimRng,
) -> f64 {
    let v = state.intensity;
    match regime {
        IntensityRegime::Terrain => {
            let relief = conditions.elevation.min(TERRAIN_ELEVATION_CAP_M) / 1000.0;
            state.size_km *= 1.06;
            v - v * (0.06 + 0.12 * relief)
        }
        IntensityRegime::Land => {
            state.size_km *= 1.03;
            v - (v * 0.12 + 1.0)
        }
        IntensityRegime::NearLand => {
            state.size_km *= 1.01;
            v - v * 0.03
        }
        IntensityRegime::Extratropical => match state.extratropical {
            ExtratropicalStage::Developing { .. } => {
                state.size_km *= 1.08;
                v + rng.range(-2.0, 4.0)
            }
            _ => {
                state.size_km *= 1.05;
                v - rng.range(3.0, 7.0)
            }
        },
        IntensityRegime::OpenOcean => open_ocean(state, conditions, rng),
    }
}

/// Move the eyewall replacement cycle past any phase whose deadline has passed.
///
/// Runs every step whatever the regime, so a cycle interrupted by landfall or
/// transition still completes on schedule.
pub fn advance_eyewall_cycle(state: &mut CycloneState, rng: &mut SimRng) {
    let age = state.age_hours;
    match state.eyewall_cycle {
        EyewallCycle::Weakening { until, reduction } if age >= until => {
            let recover_until = age + rng.range(ERC_PHASE_HOURS.0, ERC_PHASE_HOURS.1);
            state.eyewall_cycle = EyewallCycle::Recovering { until: recover_until };
            debug!(storm = %state.display_name(), reduction, "Outer eyewall took over, recovering");
        }
        EyewallCycle::Recovering { until } if age >= until => {
            state.eyewall_cycle = EyewallCycle::None;
            debug!(storm = %state.display_name(), "Eyewall replacement cycle complete");
        }
        _ => {}
    }
}

fn open_ocean(state: &mut CycloneState, conditions: &LocalConditions, rng: &mut SimRng) -> f64 {
    let v = state.intensity;
    let age = state.age_hours;
    let mpi = potential_intensity(conditions.sst);

    // === EYEWALL REPLACEMENT ===
    if state.eyewall_cycle == EyewallCycle::None
        && v >= ERC_MIN_INTENSITY
        && !conditions.land.is_near_land
        && !state.is_subtropical()
        && !state.is_monsoon_depression()
        && rng.chance(ERC_PROBABILITY)
    {
        let until = age + rng.range(ERC_PHASE_HOURS.0, ERC_PHASE_HOURS.1);
        state.eyewall_cycle = EyewallCycle::Weakening { until, reduction: 0.0 };
        debug!(storm = %state.display_name(), intensity = v, "Eyewall replacement cycle started");
    }

    let mut weakening_loss = None;
    match state.eyewall_cycle {
        EyewallCycle::Weakening { until, reduction } => {
            let loss = rng.range(1.0, 3.0);
            state.eyewall_cycle = EyewallCycle::Weakening {
                until,
                reduction: reduction + loss,
            };
            state.size_km *= 1.04;
            weakening_loss = Some(loss);
        }
        EyewallCycle::Recovering { .. } => state.size_km *= 0.97,
        EyewallCycle::None => {}
    }

    // === POTENTIAL-DRIVEN RATE ===
    let mut rate = if v < mpi {
        let raw = (mpi - v) * 0.06 * rng.range(0.4, 1.4);
        let cap = (4.0 + 0.08 * v).clamp(4.0, 12.0) * latitude_factor(state.lat);
        raw.min(cap)
    } else {
        (mpi - v) * 0.15
    };

    rate -= shear_penalty(conditions.shear_kt);
    rate -= dry_air_penalty(conditions.ring_humidity, state.size_km);

    if rate > 0.0 {
        if state.is_monsoon_depression() {
            rate *= MONSOON_RATE_FACTOR;
        }
        if state.is_subtropical() {
            rate *= SUBTROPICAL_RATE_FACTOR;
        }
    }

    if let Some(loss) = weakening_loss {
        rate = rate.min(0.0) - loss;
    }

    let mut next = v + rate;
    if state.is_subtropical() {
        next = next.min(SUBTROPICAL_CAP_KT);
    }

    if state.eyewall_cycle == EyewallCycle::None {
        state.size_km += (equilibrium_size(next) - state.size_km) * 0.05;
    }

    next
}

//! The single step function that advances a storm by one 3-hour time quantum.

use tracing::{debug, info};

use crate::simulation::intensity::{self, IntensityRegime, LocalConditions};
use crate::simulation::rng::SimRng;
use crate::simulation::sphere_math;
use crate::simulation::steering::{self, WindVector};
use crate::simulation::wind_radii;
use crate::simulation::ModelSettings;
use crate::world::cyclone::{CycloneState, ExtratropicalStage, ShearEvent, StormStatus, TrackPoint};
use crate::world::environment::{Environment, DEFAULT_HUMIDITY};
use crate::world::names::NameRegistry;
use crate::world::pressure_cells::{Layer, PressureFieldModel};

pub const TIME_STEP_HOURS: f64 = 3.0;
pub const NAMING_THRESHOLD_KT: f64 = 34.0;
pub const INTENSITY_FLOOR_KT: f64 = 10.0;
pub const DISSIPATION_KT: f64 = 15.0;
pub const ET_DISSIPATION_KT: f64 = 25.0;
pub const MAX_ABS_LAT: f64 = 70.0;
pub const SIZE_MIN_KM: f64 = 100.0;
pub const SIZE_MAX_KM: f64 = 1200.0;
pub const NEAR_LAND_DEG: f64 = 1.5;
pub const ACE_THRESHOLD_KT: f64 = 34.0;

const SHEAR_EVENT_PROBABILITY: f64 = 0.03;
const TROPICAL_SST: f64 = 26.0;
const ET_SST: f64 = 20.0;
const FRONTAL_PROXIMITY_DEG: f64 = 8.0;
const ET_DEVELOPING_HOURS: f64 = 24.0;
const HEADING_RELAXATION: f64 = 0.3;
const SPEED_RELAXATION: f64 = 0.3;

/// Everything a step reads, plus the two things it may advance (RNG, name registry).
pub struct StepInputs<'a> {
    pub pressure: &'a PressureFieldModel,
    pub environment: &'a Environment,
    pub settings: &'a ModelSettings,
    pub rng: &'a mut SimRng,
    pub names: &'a mut NameRegistry,
}

/// Notable transitions during one step, for statistics and callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub named: Option<String>,
    pub extratropical_transition: bool,
    pub dissipated: bool,
    pub regime: Option<IntensityRegime>,
}

/// Latitude (absolute, degrees) of the baroclinic zone in the storm's hemisphere.
///
/// Half the latitude of the strongest upper westerly between 25 and 60 degrees at
/// this longitude, half a seasonal climatology.
pub fn frontal_zone_latitude(pressure: &PressureFieldModel, lon: f64, hemisphere: f64, month: u32) -> f64 {
    let mut best_lat = 25.0;
    let mut best_u = f64::NEG_INFINITY;
    for i in 0..=14 {
        let abs_lat = 25.0 + 2.5 * i as f64;
        let u = steering::layer_wind(pressure, lon, abs_lat * hemisphere, Layer::Upper).x;
        if u > best_u {
            best_u = u;
            best_lat = abs_lat;
        }
    }
    // Southern hemisphere seasons run six months out of phase
    let seasonal_month = if hemisphere < 0.0 { (month + 5) % 12 + 1 } else { month };
    let climatology = 36.0 + 6.0 * ((seasonal_month as f64 - 4.0) * std::f64::consts::TAU / 12.0).sin();
    0.5 * best_lat + 0.5 * climatology
}

/// Whether the storm should begin extratropical transition now.
pub fn should_transition(abs_lat: f64, sst: f64, frontal_lat: f64) -> bool {
    (sst < ET_SST && (abs_lat - frontal_lat).abs() <= FRONTAL_PROXIMITY_DEG) || abs_lat > frontal_lat
}

/// Turn toward the steering flow and move for `hours`.
pub fn translate(state: &mut CycloneState, flow: WindVector, hours: f64) {
    let target = sphere_math::tangent_to_bearing(flow.x, flow.y);
    let turn = sphere_math::angle_difference(state.heading, target);
    state.heading = sphere_math::wrap_lon_360(state.heading + HEADING_RELAXATION * turn);
    state.speed += SPEED_RELAXATION * (flow.length() - state.speed);

    let (lat, lon) = sphere_math::advance_along_heading(state.lat, state.lon, state.heading, state.speed * hours);
    state.lat = lat;
    state.lon = lon;
}

/// Mean humidity on an 8-point ring at the circulation radius.
fn ring_humidity(state: &CycloneState, inputs: &StepInputs<'_>) -> f64 {
    let settings = inputs.settings;
    let total: f64 = (0..8)
        .map(|i| {
            let (lat, lon) = sphere_math::offset_point(state.lat, state.lon, i as f64 * 45.0, state.size_km);
            inputs.environment.humidity(
                lon,
                lat,
                inputs.pressure,
                settings.month,
                Some(state),
                settings.global_temperature_k,
            )
        })
        .sum();
    total / 8.0
}

fn begin_extratropical(state: &mut CycloneState, reason: &str) {
    state.extratropical = ExtratropicalStage::Developing { since: state.age_hours };
    state.subtropical_until = None;
    state.monsoon_until = None;
    info!(
        storm = %state.display_name(),
        lat = state.lat,
        intensity = state.intensity,
        reason,
        "Extratropical transition began"
    );
}

/// Advance one storm by `TIME_STEP_HOURS`. Dissipated storms are left untouched.
pub fn step_cyclone(state: &mut CycloneState, inputs: &mut StepInputs<'_>) -> StepReport {
    let mut report = StepReport::default();
    if !state.is_active() {
        return report;
    }

    let settings = inputs.settings;
    state.age_hours += TIME_STEP_HOURS;
    let age = state.age_hours;

    // === SAMPLE ENVIRONMENT ===
    let env = inputs.environment;
    let sst = env.sea_surface_temperature(state.lat, state.lon, settings.month, settings.global_temperature_k);
    let land = env.land_status(state.lon, state.lat, NEAR_LAND_DEG);
    let elevation = env.elevation_at(state.lon, state.lat);
    let steer = steering::steering(inputs.pressure, state.lon, state.lat, WindVector::ZERO);

    // === TIMERS ===
    match state.shear_event {
        Some(event) if age >= event.until => {
            state.shear_event = None;
            debug!(storm = %state.display_name(), "Shear event ended");
        }
        Some(_) => {}
        None => {
            if inputs.rng.chance(SHEAR_EVENT_PROBABILITY) {
                let magnitude = inputs.rng.range(5.0, 20.0);
                let until = age + inputs.rng.range(12.0, 48.0);
                state.shear_event = Some(ShearEvent { until, magnitude });
                debug!(storm = %state.display_name(), magnitude, until, "Shear event started");
            }
        }
    }

    intensity::advance_eyewall_cycle(state, inputs.rng);

    if state.monsoon_until.is_some_and(|deadline| age >= deadline) {
        state.monsoon_until = None;
        debug!(storm = %state.display_name(), "Monsoon depression consolidated");
    }

    if let Some(deadline) = state.subtropical_until {
        if sst < ET_SST {
            begin_extratropical(state, "subtropical over cold water");
            report.extratropical_transition = true;
        } else if age >= deadline {
            if sst >= TROPICAL_SST {
                state.subtropical_until = None;
                debug!(storm = %state.display_name(), sst, "Subtropical storm became tropical");
            } else {
                begin_extratropical(state, "subtropical deadline over cool water");
                report.extratropical_transition = true;
            }
        }
    }

    // === EXTRATROPICAL TRANSITION ===
    if !state.is_extratropical() {
        let frontal = frontal_zone_latitude(inputs.pressure, state.lon, state.hemisphere(), settings.month);
        if should_transition(state.lat.abs(), sst, frontal) {
            begin_extratropical(state, "frontal zone");
            report.extratropical_transition = true;
        }
    } else if let ExtratropicalStage::Developing { since } = state.extratropical {
        if age - since >= ET_DEVELOPING_HOURS {
            state.extratropical = ExtratropicalStage::Decaying { since: age };
            debug!(storm = %state.display_name(), "Extratropical low now decaying");
        }
    }

    // === INTENSITY ===
    let regime = IntensityRegime::classify(state, elevation, land);
    report.regime = Some(regime);
    let event_kt = state.shear_event.map_or(0.0, |e| e.magnitude);
    let shear_kt = intensity::effective_shear_kt(
        steer.shear.length(),
        settings.shear_scale,
        event_kt,
        state.basin,
        settings.month,
    );
    let ring = if regime == IntensityRegime::OpenOcean {
        ring_humidity(state, inputs)
    } else {
        DEFAULT_HUMIDITY
    };
    let conditions = LocalConditions {
        sst,
        land,
        elevation,
        shear_kt,
        ring_humidity: ring,
    };
    let raw = intensity::apply_regime(state, regime, &conditions, inputs.rng);

    let dissipating = raw < DISSIPATION_KT || (state.is_extratropical() && raw < ET_DISSIPATION_KT);
    state.intensity = raw.max(INTENSITY_FLOOR_KT);
    state.size_km = state.size_km.clamp(SIZE_MIN_KM, SIZE_MAX_KM);

    // === MOTION ===
    translate(state, steer.flow, TIME_STEP_HOURS);

    if (age as u64) % 6 == 0 && state.intensity >= ACE_THRESHOLD_KT && !state.is_extratropical() {
        state.ace += state.intensity * state.intensity * 1e-4;
    }

    // === NAMING ===
    if state.name.is_none() && !state.is_extratropical() && state.intensity >= NAMING_THRESHOLD_KT {
        let name = inputs.names.next_name(state.basin);
        info!(name = %name, basin = ?state.basin, intensity = state.intensity, "Storm named");
        state.name = Some(name.clone());
        report.named = Some(name);
    }

    // === TRACK ===
    let point = track_point(state, inputs.pressure);
    state.track.push(point);

    if dissipating || state.lat.abs() > MAX_ABS_LAT {
        state.status = StormStatus::Dissipated;
        report.dissipated = true;
        info!(
            storm = %state.display_name(),
            age_hours = age,
            lat = state.lat,
            peak = state.peak_intensity(),
            ace = state.ace,
            "Storm dissipated"
        );
    }

    report
}

/// Snapshot of the current state for the track.
pub fn track_point(state: &CycloneState, pressure: &PressureFieldModel) -> TrackPoint {
    let environment_hpa = pressure.pressure_at(state.lon, state.lat, Layer::Lower);
    TrackPoint {
        age_hours: state.age_hours,
        lon: state.lon,
        lat: state.lat,
        intensity: state.intensity,
        pressure_hpa: wind_radii::central_pressure(state.intensity, environment_hpa),
        category: state.category(),
        extratropical: state.is_extratropical(),
        subtropical: state.is_subtropical(),
        monsoon: state.is_monsoon_depression(),
        eyewall_cycle: !matches!(state.eyewall_cycle, crate::world::cyclone::EyewallCycle::None),
        wind_radii: wind_radii::measure_wind_radii(state),
    }
}

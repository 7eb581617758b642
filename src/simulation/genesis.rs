use tracing::info;

use crate::config::genesis::{GenesisKind, GenesisParams};
use crate::simulation::cyclone::{track_point, SIZE_MAX_KM, SIZE_MIN_KM};
use crate::simulation::rng::SimRng;
use crate::simulation::sphere_math;
use crate::world::cyclone::CycloneState;
use crate::world::names::Basin;
use crate::world::pressure_cells::PressureFieldModel;

const MONSOON_AUTO_PROBABILITY: f64 = 0.3;
const MONSOON_SIZE_KM: f64 = 600.0;
const SUBTROPICAL_MIN_LAT: f64 = 25.0;
const HYBRID_PHASE_HOURS: (f64, f64) = (24.0, 72.0);

/// Resolve `Auto` into a concrete kind for this position.
pub fn resolve_kind(kind: GenesisKind, basin: Basin, lat: f64, rng: &mut SimRng) -> GenesisKind {
    match kind {
        GenesisKind::Auto => {
            let monsoon_trough = matches!(basin, Basin::WestPacific | Basin::NorthIndian);
            if monsoon_trough && rng.chance(MONSOON_AUTO_PROBABILITY) {
                GenesisKind::Monsoon
            } else if lat.abs() > SUBTROPICAL_MIN_LAT {
                GenesisKind::Subtropical
            } else {
                GenesisKind::Tropical
            }
        }
        other => other,
    }
}

/// Create a new storm with its genesis point already on the track.
pub fn spawn_cyclone(params: &GenesisParams, pressure: &PressureFieldModel, rng: &mut SimRng) -> CycloneState {
    let lon = sphere_math::normalize_lon(params.lon);
    let basin = Basin::containing(lon, params.lat);
    let kind = resolve_kind(params.kind, basin, params.lat, rng);

    let mut storm = CycloneState::new(
        lon,
        params.lat,
        params.intensity,
        params.size_km.clamp(SIZE_MIN_KM, SIZE_MAX_KM),
        basin,
    );
    // Trades carry new storms west, drifting poleward
    storm.heading = 270.0 + 15.0 * storm.hemisphere();

    match kind {
        GenesisKind::Monsoon => {
            storm.size_km = MONSOON_SIZE_KM;
            storm.monsoon_until = Some(rng.range(HYBRID_PHASE_HOURS.0, HYBRID_PHASE_HOURS.1));
        }
        GenesisKind::Subtropical => {
            storm.subtropical_until = Some(rng.range(HYBRID_PHASE_HOURS.0, HYBRID_PHASE_HOURS.1));
        }
        GenesisKind::Tropical | GenesisKind::Auto => {}
    }

    let origin = track_point(&storm, pressure);
    storm.track.push(origin);

    info!(
        basin = ?basin,
        kind = ?kind,
        lon = storm.lon,
        lat = storm.lat,
        intensity = storm.intensity,
        "Cyclone genesis"
    );
    storm
}

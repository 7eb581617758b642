use noise::{NoiseFn, Perlin};

use crate::simulation::sphere_math;
use crate::world::cyclone::CycloneState;
use crate::world::environment::{
    climatological_sst, HumiditySource, LandSource, LandStatus, SeaSurfaceSource, TerrainSource,
};
use crate::world::pressure_cells::{Layer, PressureFieldModel};

/// Procedural stand-in for real geography: Perlin continents sampled on the unit
/// sphere (so there is no seam at the date line), with humidity and SST derived from
/// latitude, season, the pressure field and the storm.
#[derive(Clone)]
pub struct SyntheticEarth {
    seed: u32,
    continents: Perlin,
    detail: Perlin,
}

impl std::fmt::Debug for SyntheticEarth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticEarth").field("seed", &self.seed).finish()
    }
}

const CONTINENT_SCALE: f64 = 1.6;
const DETAIL_SCALE: f64 = 6.0;
const SEA_LEVEL_OFFSET: f64 = 0.15;
const MAX_RELIEF_M: f64 = 4500.0;

impl SyntheticEarth {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            continents: Perlin::new(seed),
            detail: Perlin::new(seed.wrapping_add(1)),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Positive over land, negative over ocean.
    fn continentality(&self, lon: f64, lat: f64) -> f64 {
        let (x, y, z) = sphere_math::lat_lon_to_xyz(lat, lon);
        let c = self
            .continents
            .get([x * CONTINENT_SCALE, y * CONTINENT_SCALE, z * CONTINENT_SCALE]);
        let d = self.detail.get([x * DETAIL_SCALE, y * DETAIL_SCALE, z * DETAIL_SCALE]);
        c + 0.25 * d - SEA_LEVEL_OFFSET
    }

    fn is_land(&self, lon: f64, lat: f64) -> bool {
        self.continentality(lon, lat) > 0.0
    }
}

impl TerrainSource for SyntheticEarth {
    fn elevation_at(&self, lon: f64, lat: f64) -> f64 {
        let c = self.continentality(lon, lat);
        if c <= 0.0 {
            return 0.0;
        }
        let (x, y, z) = sphere_math::lat_lon_to_xyz(lat, lon);
        let ridges = self
            .detail
            .get([x * DETAIL_SCALE * 2.0, y * DETAIL_SCALE * 2.0, z * DETAIL_SCALE * 2.0])
            .abs();
        (c * MAX_RELIEF_M * (0.6 + 0.8 * ridges)).min(MAX_RELIEF_M)
    }
}

impl LandSource for SyntheticEarth {
    fn land_status(&self, lon: f64, lat: f64, near_threshold_deg: f64) -> LandStatus {
        if self.is_land(lon, lat) {
            return LandStatus::LAND;
        }
        let lon_scale = lat.to_radians().cos().max(0.05);
        let is_near_land = (0..8).any(|i| {
            let angle = (i as f64 * 45.0).to_radians();
            let sample_lat = (lat + near_threshold_deg * angle.cos()).clamp(-90.0, 90.0);
            let sample_lon = lon + near_threshold_deg * angle.sin() / lon_scale;
            self.is_land(sample_lon, sample_lat)
        });
        LandStatus {
            is_land: false,
            is_near_land,
        }
    }
}

impl HumiditySource for SyntheticEarth {
    fn background_humidity(
        &self,
        lon: f64,
        lat: f64,
        pressure: &PressureFieldModel,
        _month: u32,
        cyclone: Option<&CycloneState>,
        global_temperature_k: f64,
    ) -> f64 {
        let abs_lat = lat.abs();
        let zonal = if abs_lat < 12.0 {
            80.0
        } else if abs_lat < 35.0 {
            80.0 - (abs_lat - 12.0) * 1.3
        } else {
            50.0 + (abs_lat - 35.0).min(20.0) * 0.75
        };

        // Subsidence under highs dries the mid levels
        let anomaly = pressure.pressure_at(lon, lat, Layer::Lower) - crate::simulation::pressure::BASELINE_HPA;
        let mut humidity = zonal - 1.2 * anomaly;

        if let Some(storm) = cyclone.filter(|c| c.is_active()) {
            let distance_km = sphere_math::distance_km(lat, lon, storm.lat, storm.lon);
            let reach = storm.size_km * 3.0;
            if distance_km < reach {
                humidity += 15.0 * (1.0 - distance_km / reach);
            }
        }

        if self.is_land(lon, lat) {
            humidity -= 12.0;
        }

        humidity += 0.8 * (global_temperature_k - 288.0);
        humidity.clamp(5.0, 100.0)
    }
}

impl SeaSurfaceSource for SyntheticEarth {
    fn sea_surface_temperature(&self, lat: f64, lon: f64, month: u32, global_temperature_k: f64) -> f64 {
        let (x, y, z) = sphere_math::lat_lon_to_xyz(lat, lon);
        let eddies = self.detail.get([x * 3.0, y * 3.0, z * 3.0]);
        climatological_sst(lat, month, global_temperature_k) + 0.8 * eddies
    }
}

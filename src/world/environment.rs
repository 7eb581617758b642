use std::fmt;
use std::sync::Arc;

use crate::world::cyclone::CycloneState;
use crate::world::pressure_cells::PressureFieldModel;

pub const DEFAULT_HUMIDITY: f64 = 70.0;
pub const SST_MIN_C: f64 = -2.0;
pub const SST_MAX_C: f64 = 35.0;

/// Land classification at a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LandStatus {
    pub is_land: bool,
    /// Within the requested threshold of land (true when `is_land`).
    pub is_near_land: bool,
}

impl LandStatus {
    pub const OCEAN: LandStatus = LandStatus {
        is_land: false,
        is_near_land: false,
    };
    pub const LAND: LandStatus = LandStatus {
        is_land: true,
        is_near_land: true,
    };
}

pub trait TerrainSource: Send + Sync {
    /// Elevation in metres; 0 for ocean or unknown.
    fn elevation_at(&self, lon: f64, lat: f64) -> f64;
}

pub trait LandSource: Send + Sync {
    fn land_status(&self, lon: f64, lat: f64, near_threshold_deg: f64) -> LandStatus;
}

pub trait HumiditySource: Send + Sync {
    /// Mid-level relative humidity in percent.
    fn background_humidity(
        &self,
        lon: f64,
        lat: f64,
        pressure: &PressureFieldModel,
        month: u32,
        cyclone: Option<&CycloneState>,
        global_temperature_k: f64,
    ) -> f64;
}

pub trait SeaSurfaceSource: Send + Sync {
    /// Sea-surface temperature in Celsius.
    fn sea_surface_temperature(&self, lat: f64, lon: f64, month: u32, global_temperature_k: f64) -> f64;
}

/// Zonal-mean SST climatology used when no SST source is attached.
pub fn climatological_sst(lat: f64, month: u32, global_temperature_k: f64) -> f64 {
    // Warmest water follows the sun: northern peak in September, southern in March
    let season = ((month as f64 - 6.0) * std::f64::consts::TAU / 12.0).sin();
    let shifted = lat - 4.0 * season;
    let base = 29.0 - 0.012 * shifted * shifted;
    (base + (global_temperature_k - 288.0)).clamp(SST_MIN_C, SST_MAX_C)
}

/// The read-only collaborators the model consults, with fallbacks for missing ones.
#[derive(Clone, Default)]
pub struct Environment {
    terrain: Option<Arc<dyn TerrainSource>>,
    land: Option<Arc<dyn LandSource>>,
    humidity: Option<Arc<dyn HumiditySource>>,
    sst: Option<Arc<dyn SeaSurfaceSource>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("terrain", &self.terrain.is_some())
            .field("land", &self.land.is_some())
            .field("humidity", &self.humidity.is_some())
            .field("sst", &self.sst.is_some())
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one source for all four collaborators.
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: TerrainSource + LandSource + HumiditySource + SeaSurfaceSource + 'static,
    {
        Self {
            terrain: Some(source.clone()),
            land: Some(source.clone()),
            humidity: Some(source.clone()),
            sst: Some(source),
        }
    }

    pub fn with_terrain(mut self, source: Arc<dyn TerrainSource>) -> Self {
        self.terrain = Some(source);
        self
    }

    pub fn with_land(mut self, source: Arc<dyn LandSource>) -> Self {
        self.land = Some(source);
        self
    }

    pub fn with_humidity(mut self, source: Arc<dyn HumiditySource>) -> Self {
        self.humidity = Some(source);
        self
    }

    pub fn with_sst(mut self, source: Arc<dyn SeaSurfaceSource>) -> Self {
        self.sst = Some(source);
        self
    }

    pub fn elevation_at(&self, lon: f64, lat: f64) -> f64 {
        self.terrain
            .as_ref()
            .map_or(0.0, |t| t.elevation_at(lon, lat))
            .max(0.0)
    }

    pub fn land_status(&self, lon: f64, lat: f64, near_threshold_deg: f64) -> LandStatus {
        match &self.land {
            Some(land) => {
                let status = land.land_status(lon, lat, near_threshold_deg);
                LandStatus {
                    is_land: status.is_land,
                    is_near_land: status.is_near_land || status.is_land,
                }
            }
            None => LandStatus::OCEAN,
        }
    }

    /// Humidity clamped to [0, 100].
    pub fn humidity(
        &self,
        lon: f64,
        lat: f64,
        pressure: &PressureFieldModel,
        month: u32,
        cyclone: Option<&CycloneState>,
        global_temperature_k: f64,
    ) -> f64 {
        let value = self.humidity.as_ref().map_or(DEFAULT_HUMIDITY, |h| {
            h.background_humidity(lon, lat, pressure, month, cyclone, global_temperature_k)
        });
        if value.is_finite() {
            value.clamp(0.0, 100.0)
        } else {
            DEFAULT_HUMIDITY
        }
    }

    /// SST clamped to a physically plausible range.
    pub fn sea_surface_temperature(&self, lat: f64, lon: f64, month: u32, global_temperature_k: f64) -> f64 {
        let value = self.sst.as_ref().map_or_else(
            || climatological_sst(lat, month, global_temperature_k),
            |s| s.sea_surface_temperature(lat, lon, month, global_temperature_k),
        );
        if value.is_finite() {
            value.clamp(SST_MIN_C, SST_MAX_C)
        } else {
            climatological_sst(lat, month, global_temperature_k)
        }
    }
}

/// A horizontally uniform world: the same answer everywhere.
///
/// Handy for scenario runs ("open ocean at 29 C") and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformEnvironment {
    pub elevation: f64,
    pub land: LandStatus,
    pub humidity: f64,
    pub sst: f64,
}

impl UniformEnvironment {
    pub fn open_ocean(sst: f64, humidity: f64) -> Self {
        Self {
            elevation: 0.0,
            land: LandStatus::OCEAN,
            humidity,
            sst,
        }
    }

    pub fn highlands(elevation: f64) -> Self {
        Self {
            elevation,
            land: LandStatus::LAND,
            humidity: 70.0,
            sst: 28.0,
        }
    }

    pub fn into_environment(self) -> Environment {
        Environment::from_source(Arc::new(self))
    }
}

impl TerrainSource for UniformEnvironment {
    fn elevation_at(&self, _lon: f64, _lat: f64) -> f64 {
        self.elevation
    }
}

impl LandSource for UniformEnvironment {
    fn land_status(&self, _lon: f64, _lat: f64, _near_threshold_deg: f64) -> LandStatus {
        self.land
    }
}

impl HumiditySource for UniformEnvironment {
    fn background_humidity(
        &self,
        _lon: f64,
        _lat: f64,
        _pressure: &PressureFieldModel,
        _month: u32,
        _cyclone: Option<&CycloneState>,
        _global_temperature_k: f64,
    ) -> f64 {
        self.humidity
    }
}

impl SeaSurfaceSource for UniformEnvironment {
    fn sea_surface_temperature(&self, _lat: f64, _lon: f64, _month: u32, _global_temperature_k: f64) -> f64 {
        self.sst
    }
}

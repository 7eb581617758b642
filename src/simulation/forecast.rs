//! Forward projection of a storm on private copies of the model.
//!
//! A projection never touches the live state: the storm is cloned, the pressure
//! field forked and randomness drawn from a generator seeded by the model id. Motion
//! uses the same translation as the live step; intensity uses a simplified
//! potential/shear model on a coarser cadence.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::simulation::ForecastModelConfig;
use crate::simulation::cyclone::{
    frontal_zone_latitude, should_transition, translate, INTENSITY_FLOOR_KT, NEAR_LAND_DEG, TIME_STEP_HOURS,
};
use crate::simulation::intensity::{effective_shear_kt, potential_intensity, SHEAR_THRESHOLD_KT};
use crate::simulation::rng::SimRng;
use crate::simulation::steering::{steering, WindVector};
use crate::simulation::ModelSettings;
use crate::world::cyclone::CycloneState;
use crate::world::environment::Environment;
use crate::world::pressure_cells::PressureFieldModel;

/// A forecast model with a systematic steering bias (km/h).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastModel {
    pub id: String,
    pub bias_u: f64,
    pub bias_v: f64,
}

impl ForecastModel {
    pub fn new(id: &str, bias_u: f64, bias_v: f64) -> Self {
        Self {
            id: id.to_string(),
            bias_u,
            bias_v,
        }
    }

    pub fn bias(&self) -> WindVector {
        WindVector::new(self.bias_u, self.bias_v)
    }

    /// Stable per-model seed (FNV-1a of the id).
    pub fn seed(&self) -> u64 {
        self.id.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl From<&ForecastModelConfig> for ForecastModel {
    fn from(config: &ForecastModelConfig) -> Self {
        ForecastModel::new(&config.id, config.bias_u, config.bias_v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionSchedule {
    pub horizon_hours: u32,
    pub path_step_hours: u32,
    pub intensity_step_hours: u32,
}

impl Default for ProjectionSchedule {
    fn default() -> Self {
        Self {
            horizon_hours: 72,
            path_step_hours: 3,
            intensity_step_hours: 6,
        }
    }
}

impl ProjectionSchedule {
    pub fn with_horizon(horizon_hours: u32) -> Self {
        Self {
            horizon_hours,
            ..Self::default()
        }
    }

    /// Pressure-field ticks per path step. Cell drift is defined per model tick.
    pub fn field_steps_per_path_step(&self) -> u32 {
        ((self.path_step_hours.max(1) as f64 / TIME_STEP_HOURS).round() as u32).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub hours: f64,
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
    pub extratropical: bool,
    pub over_land: bool,
    /// Intensity was recomputed at this point
    pub intensity_updated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTrack {
    pub model_id: String,
    pub bias_u: f64,
    pub bias_v: f64,
    pub points: Vec<ForecastPoint>,
}

impl ForecastTrack {
    fn empty(model: &ForecastModel) -> Self {
        Self {
            model_id: model.id.clone(),
            bias_u: model.bias_u,
            bias_v: model.bias_v,
            points: Vec::new(),
        }
    }
}

/// Project one model's track. Empty when the storm is extratropical or dissipated.
pub fn project(
    cyclone: &CycloneState,
    pressure: &PressureFieldModel,
    environment: &Environment,
    settings: &ModelSettings,
    model: &ForecastModel,
    schedule: &ProjectionSchedule,
) -> ForecastTrack {
    let mut track = ForecastTrack::empty(model);
    if cyclone.is_extratropical() || !cyclone.is_active() {
        return track;
    }

    let mut storm = cyclone.clone();
    storm.track.clear();
    let mut field = pressure.fork();
    let mut rng = SimRng::new(model.seed());
    let bias = model.bias();
    let path_step = schedule.path_step_hours.max(1);
    let intensity_step = schedule.intensity_step_hours.max(1);

    let origin_land = environment.land_status(storm.lon, storm.lat, NEAR_LAND_DEG);
    track.points.push(ForecastPoint {
        hours: 0.0,
        lon: storm.lon,
        lat: storm.lat,
        intensity: storm.intensity,
        extratropical: false,
        over_land: origin_land.is_land,
        intensity_updated: false,
    });

    let field_steps = schedule.field_steps_per_path_step();
    let mut next_update = intensity_step;
    let mut extratropical = false;
    let steps = schedule.horizon_hours / path_step;
    for i in 1..=steps {
        let hours = i * path_step;
        for _ in 0..field_steps {
            field.step(settings.month, &mut rng);
        }
        let steer = steering(&field, storm.lon, storm.lat, bias);
        translate(&mut storm, steer.flow, path_step as f64);

        let land = environment.land_status(storm.lon, storm.lat, NEAR_LAND_DEG);
        let sst = environment.sea_surface_temperature(
            storm.lat,
            storm.lon,
            settings.month,
            settings.global_temperature_k,
        );

        // First path step at or past each intensity boundary
        let intensity_updated = hours >= next_update;
        if intensity_updated {
            while next_update <= hours {
                next_update += intensity_step;
            }
            let v = storm.intensity;
            let next = if land.is_land {
                (v * 0.8).min(v - 5.0)
            } else {
                let shear_kt = effective_shear_kt(
                    steer.shear.length(),
                    settings.shear_scale,
                    0.0,
                    storm.basin,
                    settings.month,
                );
                v + 0.1 * (potential_intensity(sst) - v) - 0.3 * (shear_kt - SHEAR_THRESHOLD_KT).max(0.0)
            };
            storm.intensity = next.max(INTENSITY_FLOOR_KT);
        }

        if !extratropical {
            let frontal = frontal_zone_latitude(&field, storm.lon, storm.hemisphere(), settings.month);
            extratropical = should_transition(storm.lat.abs(), sst, frontal);
        }

        track.points.push(ForecastPoint {
            hours: hours as f64,
            lon: storm.lon,
            lat: storm.lat,
            intensity: storm.intensity,
            extratropical,
            over_land: land.is_land,
            intensity_updated,
        });
    }

    debug!(
        model = %model.id,
        points = track.points.len(),
        final_intensity = storm.intensity,
        "Forecast projected"
    );
    track
}

/// Project every model in parallel, each on its own copies.
pub fn project_ensemble(
    cyclone: &CycloneState,
    pressure: &PressureFieldModel,
    environment: &Environment,
    settings: &ModelSettings,
    models: &[ForecastModel],
    schedule: &ProjectionSchedule,
) -> Vec<ForecastTrack> {
    models
        .par_iter()
        .map(|model| project(cyclone, pressure, environment, settings, model, schedule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cyclone::ExtratropicalStage;
    use crate::world::environment::{LandStatus, UniformEnvironment};
    use crate::world::names::Basin;

    fn settings() -> ModelSettings {
        ModelSettings {
            month: 9,
            global_temperature_k: 288.0,
            shear_scale: 1.0,
        }
    }

    fn storm() -> CycloneState {
        let mut s = CycloneState::new(-50.0, 16.0, 60.0, 300.0, Basin::NorthAtlantic);
        s.speed = 15.0;
        s
    }

    #[test]
    fn default_schedule_yields_25_points() {
        let pressure = PressureFieldModel::climatological(9, 7, 1.5);
        let env = UniformEnvironment::open_ocean(29.0, 75.0).into_environment();
        let model = ForecastModel::new("consensus", 0.0, 0.0);
        let track = project(&storm(), &pressure, &env, &settings(), &model, &ProjectionSchedule::default());

        assert_eq!(track.points.len(), 25);
        assert_eq!(track.points[0].hours, 0.0);
        assert_eq!(track.points[24].hours, 72.0);
        for (i, point) in track.points.iter().enumerate() {
            let expected = i > 0 && i % 2 == 0;
            assert_eq!(point.intensity_updated, expected, "Point {} update flag", i);
        }
        assert_eq!(track.points.iter().filter(|p| p.intensity_updated).count(), 12);
    }

    #[test]
    fn intensity_changes_only_on_update_points() {
        let pressure = PressureFieldModel::default();
        let env = UniformEnvironment::open_ocean(29.0, 75.0).into_environment();
        let model = ForecastModel::new("consensus", 0.0, 0.0);
        let track = project(&storm(), &pressure, &env, &settings(), &model, &ProjectionSchedule::default());
        for pair in track.points.windows(2) {
            if !pair[1].intensity_updated {
                assert_eq!(pair[0].intensity, pair[1].intensity);
            }
        }
        assert!(track.points[2].intensity > track.points[0].intensity);
    }

    #[test]
    fn live_state_is_untouched() {
        let pressure = PressureFieldModel::climatological(9, 7, 1.5);
        let env = UniformEnvironment::open_ocean(29.0, 75.0).into_environment();
        let original = storm();
        let pressure_before = pressure.clone();
        let model = ForecastModel::new("fast-east", 3.0, 0.5);
        let _ = project(&original, &pressure, &env, &settings(), &model, &ProjectionSchedule::default());
        assert_eq!(original, storm());
        assert_eq!(pressure, pressure_before);
    }

    #[test]
    fn extratropical_source_gives_empty_track() {
        let mut s = storm();
        s.extratropical = ExtratropicalStage::Decaying { since: 0.0 };
        let model = ForecastModel::new("consensus", 0.0, 0.0);
        let track = project(
            &s,
            &PressureFieldModel::default(),
            &Environment::new(),
            &settings(),
            &model,
            &ProjectionSchedule::default(),
        );
        assert!(track.points.is_empty());
        assert_eq!(track.model_id, "consensus");
    }

    #[test]
    fn land_applies_hard_cap() {
        let env = UniformEnvironment {
            elevation: 0.0,
            land: LandStatus::LAND,
            humidity: 60.0,
            sst: 28.0,
        }
        .into_environment();
        let model = ForecastModel::new("consensus", 0.0, 0.0);
        let track = project(
            &storm(),
            &PressureFieldModel::default(),
            &env,
            &settings(),
            &model,
            &ProjectionSchedule::default(),
        );
        assert!((track.points[2].intensity - 48.0).abs() < 1e-9);
        assert!((track.points[4].intensity - 38.4).abs() < 1e-9);
        assert!(track.points.iter().all(|p| p.over_land));
        assert!(track.points.iter().all(|p| p.intensity >= INTENSITY_FLOOR_KT));
    }

    #[test]
    fn ensemble_matches_individual_runs() {
        let pressure = PressureFieldModel::climatological(9, 11, 1.5);
        let env = UniformEnvironment::open_ocean(28.5, 70.0).into_environment();
        let models = vec![
            ForecastModel::new("consensus", 0.0, 0.0),
            ForecastModel::new("fast-east", 3.0, 0.5),
            ForecastModel::new("slow-west", -2.5, -0.5),
        ];
        let schedule = ProjectionSchedule::with_horizon(48);
        let tracks = project_ensemble(&storm(), &pressure, &env, &settings(), &models, &schedule);
        assert_eq!(tracks.len(), 3);
        for (track, model) in tracks.iter().zip(&models) {
            assert_eq!(track.model_id, model.id);
            assert_eq!(track.points.len(), 17);
            let single = project(&storm(), &pressure, &env, &settings(), model, &schedule);
            assert_eq!(&single, track);
        }
        assert_ne!(tracks[1].points[16].lon, tracks[2].points[16].lon);
    }

    #[test]
    fn uneven_schedule_still_updates_each_interval() {
        let env = UniformEnvironment::open_ocean(29.0, 75.0).into_environment();
        let model = ForecastModel::new("consensus", 0.0, 0.0);
        let schedule = ProjectionSchedule {
            horizon_hours: 72,
            path_step_hours: 4,
            intensity_step_hours: 6,
        };
        let track = project(&storm(), &PressureFieldModel::default(), &env, &settings(), &model, &schedule);
        assert_eq!(track.points.len(), 19);
        let updated: Vec<f64> = track.points.iter().filter(|p| p.intensity_updated).map(|p| p.hours).collect();
        assert_eq!(updated.len(), 12);
        assert_eq!(updated[..4], [8.0, 12.0, 20.0, 24.0]);
    }

    #[test]
    fn pressure_ticks_follow_path_step() {
        assert_eq!(ProjectionSchedule::default().field_steps_per_path_step(), 1);
        let six_hourly = ProjectionSchedule {
            path_step_hours: 6,
            ..ProjectionSchedule::default()
        };
        assert_eq!(six_hourly.field_steps_per_path_step(), 2);
        let hourly = ProjectionSchedule {
            path_step_hours: 1,
            ..ProjectionSchedule::default()
        };
        assert_eq!(hourly.field_steps_per_path_step(), 1);
    }

    #[test]
    fn model_seed_is_stable() {
        assert_eq!(ForecastModel::new("a", 0.0, 0.0).seed(), ForecastModel::new("a", 9.0, 9.0).seed());
        assert_ne!(ForecastModel::new("a", 0.0, 0.0).seed(), ForecastModel::new("b", 0.0, 0.0).seed());
    }
}

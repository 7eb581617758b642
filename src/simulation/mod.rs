pub mod cyclone;
pub mod forecast;
pub mod genesis;
pub mod intensity;
pub mod pressure;
pub mod rng;
pub mod sphere_math;
pub mod statistics;
pub mod steering;
pub mod wind_radii;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::config::genesis::GenesisParams;
use crate::config::simulation::SimulationConfig;
use crate::simulation::cyclone::{StepInputs, StepReport, TIME_STEP_HOURS};
use crate::simulation::forecast::{ForecastModel, ForecastTrack, ProjectionSchedule};
use crate::simulation::rng::SimRng;
use crate::simulation::statistics::TickStatistics;
use crate::world::cyclone::CycloneState;
use crate::world::environment::Environment;
use crate::world::names::NameRegistry;
use crate::world::pressure_cells::PressureFieldModel;

/// Ticks per simulated month (30 days of 3-hour steps).
pub const TICKS_PER_MONTH: u64 = 240;

/// Run-wide physical settings read by the step functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Calendar month, 1..=12
    pub month: u32,
    pub global_temperature_k: f64,
    /// Multiplier on diagnosed vertical shear
    pub shear_scale: f64,
}

/// Everything a run owns. Passed explicitly; nothing is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationContext {
    pub id: Uuid,
    pub seed: u64,
    pub tick_count: u64,
    pub settings: ModelSettings,
    pub pressure: PressureFieldModel,
    pub cyclone: Option<CycloneState>,
    /// Parameters the current storm was spawned from
    pub genesis: Option<GenesisParams>,
    pub names: NameRegistry,
    pub rng: SimRng,
    pub forecast_models: Vec<ForecastModel>,
    pub forecast_interval_ticks: u32,
    pub forecast_horizon_hours: u32,
    pub forecasts: Vec<ForecastTrack>,
}

impl SimulationContext {
    pub fn new(config: &SimulationConfig) -> Self {
        let seed = if config.seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            config.seed
        };
        let ctx = Self {
            id: Uuid::new_v4(),
            seed,
            tick_count: 0,
            settings: ModelSettings {
                month: config.start_month,
                global_temperature_k: config.global_temperature_k,
                shear_scale: config.shear_scale,
            },
            pressure: PressureFieldModel::climatological(
                config.start_month,
                seed,
                config.pressure_noise_amplitude,
            ),
            cyclone: None,
            genesis: None,
            names: NameRegistry::default(),
            rng: SimRng::new(seed),
            forecast_models: config.forecast_models.iter().map(ForecastModel::from).collect(),
            forecast_interval_ticks: config.forecast_interval_ticks,
            forecast_horizon_hours: config.forecast_horizon_hours,
            forecasts: Vec::new(),
        };
        info!(run_id = %ctx.id, seed, month = config.start_month, "Simulation context created");
        ctx
    }

    /// Simulated hours since the run started.
    pub fn hours(&self) -> f64 {
        self.tick_count as f64 * TIME_STEP_HOURS
    }

    /// Place a new storm, replacing any previous one.
    pub fn spawn(&mut self, params: &GenesisParams) -> &CycloneState {
        let storm = genesis::spawn_cyclone(params, &self.pressure, &mut self.rng);
        self.genesis = Some(params.clone());
        self.forecasts.clear();
        self.cyclone.insert(storm)
    }

    pub fn has_active_storm(&self) -> bool {
        self.cyclone.as_ref().is_some_and(|c| c.is_active())
    }

    /// Re-run every forecast model from the current state.
    pub fn refresh_forecasts(&mut self, environment: &Environment) {
        self.forecasts = match &self.cyclone {
            Some(storm) if storm.is_active() && !storm.is_extratropical() => forecast::project_ensemble(
                storm,
                &self.pressure,
                environment,
                &self.settings,
                &self.forecast_models,
                &ProjectionSchedule::with_horizon(self.forecast_horizon_hours),
            ),
            _ => Vec::new(),
        };
    }
}

/// Result of executing a single tick.
#[derive(Debug)]
pub struct TickResult {
    pub statistics: TickStatistics,
    /// Phase timings in ms: [Pressure, Cyclone, Forecast, Statistics]
    pub phase_timings_ms: [f32; 4],
}

/// Execute a single simulation tick.
///
/// Steps the pressure field, then the storm against the updated field, advances the
/// tick counter and calendar, refreshes forecasts on their interval and finally
/// computes statistics.
pub fn execute_tick(ctx: &mut SimulationContext, environment: &Environment) -> TickResult {
    let tick_start = Instant::now();
    let mut phase_timings = [0.0_f32; 4];

    // Phase 0: pressure field
    let pressure_start = Instant::now();
    ctx.pressure.step(ctx.settings.month, &mut ctx.rng);
    phase_timings[0] = pressure_start.elapsed().as_secs_f32() * 1000.0;

    // Phase 1: storm
    let cyclone_start = Instant::now();
    let report = match ctx.cyclone.as_mut() {
        Some(storm) => {
            let mut inputs = StepInputs {
                pressure: &ctx.pressure,
                environment,
                settings: &ctx.settings,
                rng: &mut ctx.rng,
                names: &mut ctx.names,
            };
            cyclone::step_cyclone(storm, &mut inputs)
        }
        None => StepReport::default(),
    };
    phase_timings[1] = cyclone_start.elapsed().as_secs_f32() * 1000.0;

    ctx.tick_count += 1;
    if ctx.tick_count % TICKS_PER_MONTH == 0 {
        ctx.settings.month = ctx.settings.month % 12 + 1;
        info!(tick = ctx.tick_count, month = ctx.settings.month, "Month advanced");
    }

    // Phase 2: forecasts
    let forecast_start = Instant::now();
    let interval = ctx.forecast_interval_ticks.max(1) as u64;
    if ctx.tick_count % interval == 0 || report.dissipated || report.extratropical_transition {
        ctx.refresh_forecasts(environment);
    }
    phase_timings[2] = forecast_start.elapsed().as_secs_f32() * 1000.0;

    // Phase 3: statistics
    let stats_start = Instant::now();
    let tick_duration = tick_start.elapsed().as_secs_f32() * 1000.0;
    let statistics = statistics::compute_statistics(ctx, report, tick_duration);
    phase_timings[3] = stats_start.elapsed().as_secs_f32() * 1000.0;

    TickResult {
        statistics,
        phase_timings_ms: phase_timings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::genesis::GenesisKind;
    use crate::world::environment::UniformEnvironment;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed,
            ..SimulationConfig::default()
        }
    }

    fn tropical_genesis() -> GenesisParams {
        GenesisParams {
            kind: GenesisKind::Tropical,
            ..GenesisParams::new(-45.0, 12.0)
        }
    }

    fn ocean() -> Environment {
        UniformEnvironment::open_ocean(29.0, 75.0).into_environment()
    }

    #[test]
    fn new_context_uses_config() {
        let ctx = SimulationContext::new(&config(42));
        assert_eq!(ctx.seed, 42);
        assert_eq!(ctx.tick_count, 0);
        assert_eq!(ctx.settings.month, 9);
        assert_eq!(ctx.forecast_models.len(), 3);
        assert!(!ctx.pressure.upper.is_empty());
        assert!(ctx.cyclone.is_none());
    }

    #[test]
    fn zero_seed_is_randomized() {
        let ctx = SimulationContext::new(&config(0));
        assert_ne!(ctx.seed, 0);
    }

    #[test]
    fn tick_without_storm_advances_clock() {
        let mut ctx = SimulationContext::new(&config(42));
        let env = ocean();
        let result = execute_tick(&mut ctx, &env);
        assert_eq!(ctx.tick_count, 1);
        assert_eq!(result.statistics.tick, 1);
        assert_eq!(result.statistics.hours, 3.0);
        assert!(result.statistics.storm.is_none());
        assert!(ctx.forecasts.is_empty());
    }

    #[test]
    fn each_tick_appends_one_track_point() {
        let mut ctx = SimulationContext::new(&config(7));
        ctx.spawn(&tropical_genesis());
        let env = ocean();
        for _ in 0..8 {
            execute_tick(&mut ctx, &env);
        }
        let storm = ctx.cyclone.as_ref().expect("storm");
        assert_eq!(storm.track.len(), 9);
        assert_eq!(storm.age_hours, 24.0);
        assert_eq!(ctx.genesis, Some(tropical_genesis()));
    }

    #[test]
    fn month_advances_every_240_ticks() {
        let mut ctx = SimulationContext::new(&SimulationConfig {
            start_month: 12,
            ..config(3)
        });
        let env = ocean();
        for _ in 0..TICKS_PER_MONTH - 1 {
            execute_tick(&mut ctx, &env);
        }
        assert_eq!(ctx.settings.month, 12);
        execute_tick(&mut ctx, &env);
        assert_eq!(ctx.settings.month, 1);
    }

    #[test]
    fn forecasts_refresh_on_interval() {
        let mut ctx = SimulationContext::new(&config(11));
        ctx.spawn(&tropical_genesis());
        let env = ocean();

        execute_tick(&mut ctx, &env);
        assert!(ctx.forecasts.is_empty());

        let result = execute_tick(&mut ctx, &env);
        assert_eq!(ctx.forecasts.len(), 3);
        assert_eq!(result.statistics.forecast_tracks, 3);
        for track in &ctx.forecasts {
            assert_eq!(track.points.len(), 25);
            let origin = &track.points[0];
            let storm = ctx.cyclone.as_ref().expect("storm");
            assert_eq!(origin.lon, storm.lon);
            assert_eq!(origin.lat, storm.lat);
        }
    }

    #[test]
    fn same_seed_same_run() {
        let env = ocean();
        let run = || {
            let mut ctx = SimulationContext::new(&config(99));
            ctx.spawn(&tropical_genesis());
            for _ in 0..12 {
                execute_tick(&mut ctx, &env);
            }
            ctx
        };
        let a = run();
        let b = run();
        assert_eq!(a.cyclone, b.cyclone);
        assert_eq!(a.pressure, b.pressure);
        assert_eq!(a.forecasts, b.forecasts);
        assert_ne!(a.id, b.id);
    }
}

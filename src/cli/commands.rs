use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::genesis::GenesisParams;
use crate::config::simulation::SimulationConfig;
use crate::field::raster::{rasterize, RasterGrid};
use crate::field::uniforms::{FieldDomain, ReflectivityUniforms};
use crate::field::{compare_paths, MAX_DBZ};
use crate::persistence;
use crate::simulation::forecast::ForecastTrack;
use crate::simulation::statistics::StormSummary;
use crate::simulation::{self, SimulationContext};
use crate::world::cyclone::CycloneState;
use crate::world::environment::Environment;
use crate::world::synthetic::SyntheticEarth;

/// Build the environment collaborators named in the config.
pub fn build_environment(config: &SimulationConfig, seed: u64) -> Result<Environment, String> {
    match config.environment.as_str() {
        "synthetic" => Ok(Environment::from_source(Arc::new(SyntheticEarth::new(
            (seed % u32::MAX as u64) as u32,
        )))),
        "ocean" => Ok(Environment::new()),
        other => Err(format!("Unknown environment '{}'", other)),
    }
}

/// Load a context from an explicit snapshot file, or the newest valid one.
fn load_context(config: &SimulationConfig, snapshot: Option<&str>) -> Result<SimulationContext, String> {
    match snapshot {
        Some(path) => persistence::load_snapshot(Path::new(path))
            .map_err(|e| format!("Failed to load snapshot: {}", e)),
        None => persistence::load_latest_valid_snapshot(Path::new(&config.snapshot_directory))
            .map_err(|e| format!("Failed to load snapshot: {}", e)),
    }
}

/// Run a storm from genesis (or a snapshot) until it dies or `max_ticks` elapse.
pub fn run_simulation(
    config: &SimulationConfig,
    genesis_path: Option<&str>,
    resume: Option<&str>,
) -> Result<(), String> {
    let snapshot_dir = Path::new(&config.snapshot_directory);

    // 1. Context
    let mut ctx = match resume {
        Some(path) => {
            eprintln!("Resuming from {}", path);
            persistence::load_snapshot(Path::new(path)).map_err(|e| format!("Failed to load snapshot: {}", e))?
        }
        None => {
            let params = match genesis_path {
                Some(path) => GenesisParams::from_file(Path::new(path))?,
                None => {
                    let (lon, lat) = config.basin.typical_genesis();
                    GenesisParams::new(lon, lat)
                }
            };
            let mut ctx = SimulationContext::new(config);
            ctx.spawn(&params);
            ctx
        }
    };
    let environment = build_environment(config, ctx.seed)?;

    eprintln!(
        "Run {} (seed {}, month {}, tick {})",
        ctx.id, ctx.seed, ctx.settings.month, ctx.tick_count
    );

    // 2. Tick loop
    let mut ticks_since_snapshot: u32 = 0;
    let mut ticks_run: u64 = 0;
    while ticks_run < config.max_ticks && ctx.has_active_storm() {
        let result = simulation::execute_tick(&mut ctx, &environment);
        ticks_run += 1;

        let events = &result.statistics.events;
        if let Some(name) = &events.named {
            eprintln!("Tick {}: named {}", ctx.tick_count, name);
        }
        if events.extratropical_transition {
            eprintln!("Tick {}: extratropical transition", ctx.tick_count);
        }

        ticks_since_snapshot += 1;
        if ticks_since_snapshot >= config.snapshot_interval {
            match persistence::save_snapshot(&ctx, snapshot_dir) {
                Ok(path) => {
                    ticks_since_snapshot = 0;
                    eprintln!("Snapshot saved: {}", path.display());
                    if let Err(e) = persistence::prune_snapshots(snapshot_dir, config.max_snapshots as usize) {
                        eprintln!("Warning: snapshot pruning failed: {}", e);
                    }
                }
                Err(e) => eprintln!("Warning: snapshot save failed: {}", e),
            }
        }

        if ctx.tick_count % 8 == 0 {
            if let Some(storm) = &result.statistics.storm {
                info!(
                    tick = ctx.tick_count,
                    storm = %storm.name,
                    intensity = storm.intensity,
                    pressure_hpa = storm.pressure_hpa,
                    duration_ms = result.statistics.tick_duration_ms,
                    "Daily position"
                );
            }
        }
    }

    // 3. Final snapshot and summary
    match persistence::save_snapshot(&ctx, snapshot_dir) {
        Ok(path) => eprintln!("Final snapshot saved: {}", path.display()),
        Err(e) => eprintln!("Warning: final snapshot save failed: {}", e),
    }
    if let Some(storm) = &ctx.cyclone {
        print_storm_summary(storm);
    }
    eprintln!("Run stopped at tick {} after {} ticks", ctx.tick_count, ticks_run);
    Ok(())
}

/// Project every configured model from a snapshot and print the tracks as JSON.
pub fn forecast(config: &SimulationConfig, snapshot: Option<&str>) -> Result<(), String> {
    let mut ctx = load_context(config, snapshot)?;
    let environment = build_environment(config, ctx.seed)?;
    ctx.refresh_forecasts(&environment);

    if ctx.forecasts.is_empty() {
        return Err("No forecast: the storm has dissipated or gone extratropical".to_string());
    }
    let json = serde_json::to_string_pretty(&ctx.forecasts).map_err(|e| format!("Cannot encode forecast: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Render options for the `render` command.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: usize,
    pub height: usize,
    pub half_width_deg: f64,
    pub seed: u32,
    pub verify: bool,
    pub output: Option<String>,
}

#[derive(Serialize)]
struct RenderOutput<'a> {
    run_id: String,
    tick: u64,
    grid: &'a RasterGrid,
    max_dbz: f32,
    values: &'a [f32],
    forecasts: &'a [ForecastTrack],
}

/// Rasterize the reflectivity field around the storm (or origin) as JSON.
pub fn render(config: &SimulationConfig, snapshot: Option<&str>, options: &RenderOptions) -> Result<(), String> {
    let ctx = load_context(config, snapshot)?;
    let environment = build_environment(config, ctx.seed)?;

    let (lon, lat) = ctx
        .cyclone
        .as_ref()
        .map_or(config.basin.typical_genesis(), |c| (c.lon, c.lat));
    let domain = FieldDomain::centered(lon, lat, options.half_width_deg);
    let grid = RasterGrid::new(domain, options.width, options.height);
    let uniforms = ReflectivityUniforms::build(&ctx, &environment, &domain, options.seed);

    if options.verify {
        let report = compare_paths(&uniforms, &grid);
        if !report.is_exact() {
            return Err(format!(
                "Parity check failed: {} of {} samples differ (max {}), first at {:?}",
                report.mismatches, report.samples, report.max_abs_diff, report.first_mismatch
            ));
        }
        eprintln!("Parity check passed on {} samples", report.samples);
    }

    let values = rasterize(&uniforms, &grid);
    let output = RenderOutput {
        run_id: ctx.id.to_string(),
        tick: ctx.tick_count,
        grid: &grid,
        max_dbz: MAX_DBZ,
        values: &values,
        forecasts: &ctx.forecasts,
    };
    let json = serde_json::to_string(&output).map_err(|e| format!("Cannot encode field: {}", e))?;

    match &options.output {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| format!("Cannot write {}: {}", path, e))?;
            eprintln!("Field written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Print the run and storm state of the newest snapshot.
pub fn inspect(config: &SimulationConfig, show_track: bool) -> Result<(), String> {
    let ctx = load_context(config, None)?;
    print_context_summary(&ctx);
    match &ctx.cyclone {
        Some(storm) => {
            print_storm_summary(storm);
            if show_track {
                print_track(storm);
            }
        }
        None => println!("\nNo storm in this run"),
    }
    Ok(())
}

pub fn print_context_summary(ctx: &SimulationContext) {
    println!("=== Run Summary ===");
    println!("Run ID: {}", ctx.id);
    println!("Seed: {}", ctx.seed);
    println!("Tick: {} ({:.0} h)", ctx.tick_count, ctx.hours());
    println!("Month: {}", ctx.settings.month);
    println!(
        "Pressure cells: {} upper, {} lower",
        ctx.pressure.upper.len(),
        ctx.pressure.lower.len()
    );
    println!("Forecast models: {}", ctx.forecast_models.len());
}

fn print_storm_summary(storm: &CycloneState) {
    let summary = StormSummary::from_state(storm);
    println!("\n=== {} ===", summary.name);
    println!("Basin: {:?}", storm.basin);
    println!("Position: {:.1}, {:.1}", summary.lat, summary.lon);
    println!("Intensity: {:.0} kt ({})", summary.intensity, summary.category.label());
    println!("Peak: {:.0} kt", summary.peak_intensity);
    if let Some(min) = StormSummary::min_pressure(storm) {
        println!("Minimum pressure: {:.0} hPa", min);
    }
    println!("ACE: {:.2}", summary.ace);
    println!("Age: {:.0} h", summary.age_hours);
    let status = if !summary.active {
        "dissipated"
    } else if summary.extratropical {
        "extratropical"
    } else {
        "active"
    };
    println!("Status: {}", status);
}

fn print_track(storm: &CycloneState) {
    println!("\n{:>6} {:>7} {:>8} {:>5} {:>6} {:>4}", "Hour", "Lat", "Lon", "kt", "hPa", "Cat");
    println!("{}", "-".repeat(41));
    for p in &storm.track {
        let flag = if p.extratropical {
            " ET"
        } else if p.subtropical {
            " SS"
        } else if p.eyewall_cycle {
            " ERC"
        } else {
            ""
        };
        println!(
            "{:>6.0} {:>7.1} {:>8.1} {:>5.0} {:>6.0} {:>4}{}",
            p.age_hours,
            p.lat,
            p.lon,
            p.intensity,
            p.pressure_hpa,
            p.category.label(),
            flag
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> SimulationConfig {
        SimulationConfig {
            seed: 17,
            max_ticks: 12,
            snapshot_interval: 4,
            max_snapshots: 2,
            snapshot_directory: dir.path().to_string_lossy().into_owned(),
            environment: "ocean".to_string(),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn environment_by_name() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        assert!(build_environment(&config, 1).is_ok());
        config.environment = "synthetic".to_string();
        assert!(build_environment(&config, 1).is_ok());
        config.environment = "mars".to_string();
        assert!(build_environment(&config, 1).is_err());
    }

    #[test]
    fn run_writes_pruned_snapshots() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        run_simulation(&config, None, None).unwrap();

        let snapshots = persistence::list_snapshots(dir.path()).unwrap();
        assert!(!snapshots.is_empty() && snapshots.len() <= 3);
        let ctx = persistence::load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(ctx.tick_count, 12);
        assert!(ctx.cyclone.is_some());
    }

    #[test]
    fn forecast_and_render_from_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        run_simulation(&config, None, None).unwrap();

        forecast(&config, None).unwrap();

        let out = dir.path().join("field.json");
        let options = RenderOptions {
            width: 16,
            height: 12,
            half_width_deg: 4.0,
            seed: 3,
            verify: true,
            output: Some(out.to_string_lossy().into_owned()),
        };
        render(&config, None, &options).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["values"].as_array().unwrap().len(), 16 * 12);
        assert_eq!(json["tick"], 12);
    }

    #[test]
    fn missing_snapshots_reported() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let err = inspect(&config, false).unwrap_err();
        assert!(err.contains("No valid snapshots"), "Error: {}", err);
    }
}

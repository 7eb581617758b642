use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::world::names::Basin;

/// A forecast model: an identifier and a systematic steering bias in km/h.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastModelConfig {
    pub id: String,
    #[serde(default)]
    pub bias_u: f64,
    #[serde(default)]
    pub bias_v: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// 0 picks a random seed at startup
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_start_month")]
    pub start_month: u32,
    #[serde(default = "default_global_temperature_k")]
    pub global_temperature_k: f64,
    #[serde(default = "default_shear_scale")]
    pub shear_scale: f64,
    #[serde(default = "default_basin")]
    pub basin: Basin,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u32,
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_snapshot_directory")]
    pub snapshot_directory: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// "synthetic" (procedural continents) or "ocean" (uniform open ocean)
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_forecast_interval_ticks")]
    pub forecast_interval_ticks: u32,
    #[serde(default = "default_forecast_horizon_hours")]
    pub forecast_horizon_hours: u32,
    #[serde(default = "default_pressure_noise_amplitude")]
    pub pressure_noise_amplitude: f64,
    #[serde(default = "default_forecast_models")]
    pub forecast_models: Vec<ForecastModelConfig>,
}

fn default_start_month() -> u32 {
    9
}
fn default_global_temperature_k() -> f64 {
    288.0
}
fn default_shear_scale() -> f64 {
    1.0
}
fn default_basin() -> Basin {
    Basin::NorthAtlantic
}
fn default_max_ticks() -> u64 {
    240
}
fn default_snapshot_interval() -> u32 {
    40
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_snapshot_directory() -> String {
    "./snapshots".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_environment() -> String {
    "synthetic".to_string()
}
fn default_forecast_interval_ticks() -> u32 {
    2
}
fn default_forecast_horizon_hours() -> u32 {
    72
}
fn default_pressure_noise_amplitude() -> f64 {
    1.5
}
fn default_forecast_models() -> Vec<ForecastModelConfig> {
    vec![
        ForecastModelConfig {
            id: "consensus".to_string(),
            bias_u: 0.0,
            bias_v: 0.0,
        },
        ForecastModelConfig {
            id: "fast-east".to_string(),
            bias_u: 3.0,
            bias_v: 0.5,
        },
        ForecastModelConfig {
            id: "slow-west".to_string(),
            bias_u: -2.5,
            bias_v: -0.5,
        },
    ]
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: 0,
            start_month: default_start_month(),
            global_temperature_k: default_global_temperature_k(),
            shear_scale: default_shear_scale(),
            basin: default_basin(),
            max_ticks: default_max_ticks(),
            snapshot_interval: default_snapshot_interval(),
            max_snapshots: default_max_snapshots(),
            snapshot_directory: default_snapshot_directory(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            environment: default_environment(),
            forecast_interval_ticks: default_forecast_interval_ticks(),
            forecast_horizon_hours: default_forecast_horizon_hours(),
            pressure_noise_amplitude: default_pressure_noise_amplitude(),
            forecast_models: default_forecast_models(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !(1..=12).contains(&self.start_month) {
            errors.push(format!(
                "start_month must be 1-12, got {}. Example: start_month = 9",
                self.start_month
            ));
        }

        if !(250.0..=330.0).contains(&self.global_temperature_k) {
            errors.push(format!(
                "global_temperature_k must be 250-330, got {}. Example: global_temperature_k = 288.0",
                self.global_temperature_k
            ));
        }

        if !(0.0..=5.0).contains(&self.shear_scale) {
            errors.push(format!(
                "shear_scale must be 0.0-5.0, got {}. Example: shear_scale = 1.0",
                self.shear_scale
            ));
        }

        if self.max_ticks == 0 {
            errors.push(format!(
                "max_ticks must be > 0, got {}. Example: max_ticks = 240",
                self.max_ticks
            ));
        }

        if self.snapshot_interval == 0 {
            errors.push(format!(
                "snapshot_interval must be > 0, got {}. Example: snapshot_interval = 40",
                self.snapshot_interval
            ));
        }

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"json\"",
                valid_formats, self.log_format
            ));
        }

        let valid_environments = ["synthetic", "ocean"];
        if !valid_environments.contains(&self.environment.as_str()) {
            errors.push(format!(
                "environment must be one of {:?}, got '{}'. Example: environment = \"synthetic\"",
                valid_environments, self.environment
            ));
        }

        if self.forecast_interval_ticks == 0 {
            errors.push(format!(
                "forecast_interval_ticks must be > 0, got {}. Example: forecast_interval_ticks = 2",
                self.forecast_interval_ticks
            ));
        }

        if self.forecast_horizon_hours == 0
            || self.forecast_horizon_hours % 6 != 0
            || self.forecast_horizon_hours > 240
        {
            errors.push(format!(
                "forecast_horizon_hours must be a multiple of 6 in 6-240, got {}. Example: forecast_horizon_hours = 72",
                self.forecast_horizon_hours
            ));
        }

        if !(0.0..=10.0).contains(&self.pressure_noise_amplitude) {
            errors.push(format!(
                "pressure_noise_amplitude must be 0.0-10.0, got {}. Example: pressure_noise_amplitude = 1.5",
                self.pressure_noise_amplitude
            ));
        }

        let mut seen = HashSet::new();
        for model in &self.forecast_models {
            if model.id.trim().is_empty() {
                errors.push(
                    "forecast_models entries need a non-empty id. Example: { id = \"consensus\" }".to_string(),
                );
            } else if !seen.insert(model.id.as_str()) {
                errors.push(format!(
                    "forecast_models ids must be unique, '{}' appears twice. Example: {{ id = \"fast-east\", bias_u = 3.0 }}",
                    model.id
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

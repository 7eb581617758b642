use crate::simulation::cyclone::StepReport;
use crate::simulation::SimulationContext;
use crate::world::cyclone::{Category, CycloneState};
use crate::world::pressure_cells::Layer;

/// Snapshot of the live storm for per-tick reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StormSummary {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
    pub peak_intensity: f64,
    pub pressure_hpa: f64,
    pub category: Category,
    pub ace: f64,
    pub age_hours: f64,
    pub active: bool,
    pub extratropical: bool,
    pub track_points: usize,
}

impl StormSummary {
    pub fn from_state(storm: &CycloneState) -> Self {
        let pressure_hpa = storm.latest().map_or(f64::NAN, |p| p.pressure_hpa);
        Self {
            name: storm.display_name(),
            lon: storm.lon,
            lat: storm.lat,
            intensity: storm.intensity,
            peak_intensity: storm.peak_intensity(),
            pressure_hpa,
            category: storm.category(),
            ace: storm.ace,
            age_hours: storm.age_hours,
            active: storm.is_active(),
            extratropical: storm.is_extratropical(),
            track_points: storm.track.len(),
        }
    }

    /// Lowest central pressure over the recorded track.
    pub fn min_pressure(storm: &CycloneState) -> Option<f64> {
        storm.track.iter().map(|p| p.pressure_hpa).reduce(f64::min)
    }
}

/// Per-tick aggregate metrics.
#[derive(Debug, Clone)]
pub struct TickStatistics {
    pub tick: u64,
    pub hours: f64,
    pub month: u32,
    pub upper_cells: usize,
    pub lower_cells: usize,
    pub transient_cells: usize,
    pub storm: Option<StormSummary>,
    pub events: StepReport,
    pub forecast_tracks: usize,
    pub tick_duration_ms: f32,
}

/// Compute statistics for the context after a tick.
pub fn compute_statistics(ctx: &SimulationContext, events: StepReport, tick_duration_ms: f32) -> TickStatistics {
    let transient_cells = Layer::all()
        .iter()
        .map(|&layer| ctx.pressure.transient_count(layer))
        .sum();

    TickStatistics {
        tick: ctx.tick_count,
        hours: ctx.hours(),
        month: ctx.settings.month,
        upper_cells: ctx.pressure.upper.len(),
        lower_cells: ctx.pressure.lower.len(),
        transient_cells,
        storm: ctx.cyclone.as_ref().map(StormSummary::from_state),
        events,
        forecast_tracks: ctx.forecasts.iter().filter(|t| !t.points.is_empty()).count(),
        tick_duration_ms,
    }
}

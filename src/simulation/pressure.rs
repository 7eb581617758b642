//! Query and evolution of the two-layer pressure field.
//!
//! Cells are Gaussian anomalies summed over a 1013 hPa baseline. Persistent cells
//! (ridges, troughs, semi-permanent highs and lows) drift and breathe forever;
//! transient cells are spawned at runtime, decay and are removed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::field::primitives::value_noise_periodic;
use crate::simulation::rng::SimRng;
use crate::simulation::sphere_math;
use crate::world::pressure_cells::{CellKind, Layer, PressureCell, PressureFieldModel};

pub const BASELINE_HPA: f64 = 1013.0;
/// Soft cap on cells per layer; spawning is skipped once reached.
pub const MAX_CELLS_PER_LAYER: usize = 20;
/// Ambient noise lattice spacing in degrees (12 cells around the globe).
pub const NOISE_LATTICE_DEG: f64 = 30.0;

const TRANSIENT_MIN_STRENGTH: f64 = 2.0;
const TRANSIENT_MIN_LAT: f64 = 15.0;

const COLD_SURGE_PROBABILITY: f64 = 0.02;
const COLD_SURGE_STRENGTH: f64 = 14.0;
const COLD_SURGE_SOURCE: (f64, f64) = (105.0, 45.0);
const COLD_SURGE_SPREAD: (f64, f64) = (9.0, 6.0);
const COLD_SURGE_DRIFT: (f64, f64) = (0.35, -0.25);

/// November through March.
pub fn is_cold_surge_season(month: u32) -> bool {
    matches!(month, 11 | 12 | 1 | 2 | 3)
}

/// Degrees the climatological pattern sits north of its annual mean (peaks in July).
pub fn seasonal_lat_shift(month: u32) -> f64 {
    4.0 * ((month as f64 - 4.0) * std::f64::consts::TAU / 12.0).sin()
}

fn gaussian(cell: &PressureCell, lon: f64, lat: f64) -> f64 {
    let dx = sphere_math::shortest_lon_delta(lon, cell.lon);
    let dy = lat - cell.lat;
    let sx = cell.spread_lon.max(1e-3);
    let sy = cell.spread_lat.max(1e-3);
    cell.strength * (-(dx * dx / (2.0 * sx * sx) + dy * dy / (2.0 * sy * sy))).exp()
}

impl PressureFieldModel {
    /// Seasonal starting pattern with a little seeded jitter.
    pub fn climatological(month: u32, seed: u64, noise_amplitude: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shift = seasonal_lat_shift(month);

        let mut jittered = |kind: CellKind, lon: f64, lat: f64, sx: f64, sy: f64, magnitude: f64| {
            PressureCell::new(
                kind,
                sphere_math::wrap_lon_360(lon + rng.gen_range(-3.0..3.0)),
                lat + shift + rng.gen_range(-1.5..1.5),
                sx,
                sy,
                magnitude * rng.gen_range(0.9..1.1),
            )
        };

        // === UPPER: subtropical ridges and mid-latitude troughs ===
        let mut upper = vec![
            jittered(CellKind::High, 320.0, 28.0, 35.0, 9.0, 12.0),
            jittered(CellKind::High, 200.0, 27.0, 40.0, 9.0, 12.0),
            jittered(CellKind::High, 60.0, -28.0, 40.0, 9.0, 10.0),
            jittered(CellKind::High, 240.0, -28.0, 40.0, 9.0, 10.0),
            jittered(CellKind::Low, 290.0, 48.0, 18.0, 10.0, 10.0).with_drift(0.5, 0.0),
            jittered(CellKind::Low, 140.0, 50.0, 18.0, 10.0, 10.0).with_drift(0.5, 0.0),
            jittered(CellKind::Low, 20.0, -52.0, 18.0, 10.0, 10.0).with_drift(0.5, 0.0),
        ];
        if (6..=9).contains(&month) {
            upper.push(jittered(CellKind::High, 90.0, 30.0, 25.0, 8.0, 10.0));
        }

        // === LOWER: semi-permanent surface systems ===
        let lower = vec![
            jittered(CellKind::High, 325.0, 32.0, 30.0, 10.0, 20.0),
            jittered(CellKind::High, 210.0, 33.0, 35.0, 10.0, 18.0),
            jittered(CellKind::High, 350.0, -28.0, 30.0, 9.0, 16.0),
            jittered(CellKind::High, 80.0, -30.0, 30.0, 9.0, 16.0),
            jittered(CellKind::High, 260.0, -30.0, 30.0, 9.0, 16.0),
            jittered(CellKind::Low, 330.0, 60.0, 25.0, 10.0, 14.0),
            jittered(CellKind::Low, 185.0, 55.0, 25.0, 10.0, 14.0),
            jittered(CellKind::Low, 130.0, 15.0, 30.0, 6.0, 5.0),
        ];

        let breathe = |cells: Vec<PressureCell>, rng: &mut ChaCha8Rng| -> Vec<PressureCell> {
            cells
                .into_iter()
                .map(|cell| {
                    let phase = rng.gen_range(0.0..std::f64::consts::TAU);
                    match cell.kind {
                        CellKind::High if cell.drift_lon == 0.0 => cell.with_oscillation(0.05, 0.1, phase),
                        _ => cell,
                    }
                })
                .collect()
        };

        let upper = breathe(upper, &mut rng);
        let lower = breathe(lower, &mut rng);

        Self {
            upper,
            lower,
            noise_amplitude,
            noise_seed: (seed % 1000) as f32,
        }
    }

    /// Total pressure in hPa at a point.
    pub fn pressure_at(&self, lon: f64, lat: f64, layer: Layer) -> f64 {
        let cells: f64 = self.cells(layer).iter().map(|c| gaussian(c, lon, lat)).sum();
        BASELINE_HPA + cells + self.ambient_noise(lon, lat, layer)
    }

    fn ambient_noise(&self, lon: f64, lat: f64, layer: Layer) -> f64 {
        if self.noise_amplitude == 0.0 {
            return 0.0;
        }
        let layer_seed = match layer {
            Layer::Upper => self.noise_seed,
            Layer::Lower => self.noise_seed + 17.0,
        };
        let x = (sphere_math::wrap_lon_360(lon) / NOISE_LATTICE_DEG) as f32;
        let y = (lat / NOISE_LATTICE_DEG) as f32;
        let period = (360.0 / NOISE_LATTICE_DEG) as f32;
        let n = value_noise_periodic(x, y, period, layer_seed) as f64;
        self.noise_amplitude * (2.0 * n - 1.0)
    }

    /// Advance both layers one tick.
    pub fn step(&mut self, month: u32, rng: &mut SimRng) {
        self.step_layer(Layer::Upper, month, rng);
        self.step_layer(Layer::Lower, month, rng);
    }

    pub fn step_layer(&mut self, layer: Layer, month: u32, rng: &mut SimRng) {
        let cells = self.cells_mut(layer);

        // === MOVE / DECAY / BREATHE ===
        for cell in cells.iter_mut() {
            cell.lon += cell.drift_lon;
            cell.lat += cell.drift_lat;

            if cell.transient {
                let decay = 0.97 - 0.002 * (40.0 - cell.lat.abs()).max(0.0);
                cell.strength *= decay;
                cell.spread_lon *= 0.99;
                cell.spread_lat *= 0.99;
            } else {
                cell.lon = sphere_math::wrap_lon_360(cell.lon);
            }

            if let Some(osc) = cell.oscillation.as_mut() {
                osc.phase = (osc.phase + osc.speed).rem_euclid(std::f64::consts::TAU);
                let scale = 1.0 + osc.amplitude * osc.phase.sin();
                cell.spread_lon = osc.base_spread_lon * scale;
                cell.spread_lat = osc.base_spread_lat * scale;
            }
        }

        // === REMOVE DEAD ===
        let before = cells.len();
        cells.retain(|c| {
            !(c.transient && (c.strength.abs() < TRANSIENT_MIN_STRENGTH || c.lat.abs() < TRANSIENT_MIN_LAT))
        });
        if cells.len() < before {
            debug!(layer = ?layer, removed = before - cells.len(), "Transient pressure cell decayed");
        }

        // === SPAWN ===
        if layer == Layer::Lower
            && is_cold_surge_season(month)
            && !cells.iter().any(|c| c.transient)
            && cells.len() < MAX_CELLS_PER_LAYER
            && rng.chance(COLD_SURGE_PROBABILITY)
        {
            let (lon, lat) = COLD_SURGE_SOURCE;
            let (sx, sy) = COLD_SURGE_SPREAD;
            let (dx, dy) = COLD_SURGE_DRIFT;
            cells.push(
                PressureCell::new(CellKind::High, lon, lat, sx, sy, COLD_SURGE_STRENGTH)
                    .with_drift(dx, dy)
                    .into_transient(),
            );
            debug!(month, lon, lat, "Cold surge high spawned");
        }
    }

    /// Independent deep copy for forward projection.
    pub fn fork(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_is_baseline() {
        let model = PressureFieldModel::default();
        assert_eq!(model.pressure_at(12.0, 34.0, Layer::Lower), BASELINE_HPA);
        assert_eq!(model.pressure_at(-170.0, -60.0, Layer::Upper), BASELINE_HPA);
    }

    #[test]
    fn cell_peaks_at_its_centre() {
        let model = PressureFieldModel {
            lower: vec![PressureCell::new(CellKind::Low, 100.0, 20.0, 10.0, 5.0, 8.0)],
            ..Default::default()
        };
        let centre = model.pressure_at(100.0, 20.0, Layer::Lower);
        assert!((centre - (BASELINE_HPA - 8.0)).abs() < 1e-9);
        assert!(model.pressure_at(110.0, 20.0, Layer::Lower) > centre);
        assert_eq!(model.pressure_at(100.0, 20.0, Layer::Upper), BASELINE_HPA);
    }

    #[test]
    fn continuous_across_date_line() {
        let mut model = PressureFieldModel::climatological(9, 5, 1.5);
        model.lower.push(PressureCell::new(CellKind::High, 179.0, 30.0, 10.0, 8.0, 15.0));
        model.upper.push(PressureCell::new(CellKind::Low, 181.0, 45.0, 10.0, 8.0, 12.0));
        for layer in Layer::all() {
            for lat in [-40.0, 0.0, 30.0, 45.0] {
                let east = model.pressure_at(179.9, lat, *layer);
                let west = model.pressure_at(-179.9, lat, *layer);
                assert!(
                    (east - west).abs() < 0.5,
                    "Discontinuity at date line ({:?}, lat {}): {} vs {}",
                    layer,
                    lat,
                    east,
                    west
                );
                let wrapped = model.pressure_at(-179.9 + 360.0, lat, *layer);
                assert!((wrapped - west).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn continuous_across_prime_meridian() {
        let model = PressureFieldModel::climatological(1, 8, 3.0);
        let east = model.pressure_at(0.05, 20.0, Layer::Lower);
        let west = model.pressure_at(-0.05, 20.0, Layer::Lower);
        assert!((east - west).abs() < 0.2, "{} vs {}", east, west);
    }

    #[test]
    fn climatological_is_seeded() {
        let a = PressureFieldModel::climatological(9, 42, 1.5);
        let b = PressureFieldModel::climatological(9, 42, 1.5);
        let c = PressureFieldModel::climatological(9, 43, 1.5);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.upper.len() <= MAX_CELLS_PER_LAYER && a.lower.len() <= MAX_CELLS_PER_LAYER);
        for cell in a.upper.iter().chain(a.lower.iter()) {
            assert_eq!(cell.strength.signum(), cell.kind.sign());
        }
    }

    #[test]
    fn persistent_cells_wrap_longitude() {
        let mut model = PressureFieldModel {
            upper: vec![PressureCell::new(CellKind::Low, 359.8, 48.0, 18.0, 10.0, 10.0).with_drift(0.5, 0.0)],
            ..Default::default()
        };
        let mut rng = SimRng::new(1);
        model.step_layer(Layer::Upper, 9, &mut rng);
        let lon = model.upper[0].lon;
        assert!((0.0..360.0).contains(&lon));
        assert!((lon - 0.3).abs() < 1e-9, "Expected 0.3, got {}", lon);
    }

    #[test]
    fn transient_cells_decay_and_are_removed() {
        let mut model = PressureFieldModel {
            lower: vec![PressureCell::new(CellKind::High, 105.0, 45.0, 9.0, 6.0, 14.0)
                .with_drift(0.35, -0.25)
                .into_transient()],
            ..Default::default()
        };
        let mut rng = SimRng::new(3);
        // July: no respawn
        model.step_layer(Layer::Lower, 7, &mut rng);
        let first = model.lower[0].strength;
        assert!(first < 14.0 && first > 0.0);
        assert!(model.lower[0].lon > 105.0, "Transient cells drift without wrapping");

        for _ in 0..300 {
            model.step_layer(Layer::Lower, 7, &mut rng);
        }
        assert!(model.lower.is_empty(), "Transient cell never removed");
    }

    #[test]
    fn at_most_one_transient_per_layer() {
        let mut model = PressureFieldModel::climatological(1, 9, 0.0);
        let mut rng = SimRng::new(12345);
        let mut spawned = false;
        for _ in 0..2000 {
            model.step(1, &mut rng);
            let count = model.transient_count(Layer::Lower);
            assert!(count <= 1, "Found {} transient cells", count);
            spawned |= count == 1;
            assert_eq!(model.transient_count(Layer::Upper), 0);
        }
        assert!(spawned, "Expected a cold surge over 2000 winter ticks");
    }

    #[test]
    fn no_spawn_outside_season() {
        let mut model = PressureFieldModel::climatological(7, 9, 0.0);
        let mut rng = SimRng::new(777);
        for _ in 0..2000 {
            model.step(7, &mut rng);
        }
        assert_eq!(model.transient_count(Layer::Lower), 0);
    }

    #[test]
    fn oscillation_keeps_spread_within_amplitude() {
        let mut model = PressureFieldModel {
            lower: vec![PressureCell::new(CellKind::High, 0.0, 30.0, 20.0, 10.0, 10.0).with_oscillation(0.3, 0.1, 0.0)],
            ..Default::default()
        };
        let mut rng = SimRng::new(1);
        for _ in 0..100 {
            model.step_layer(Layer::Lower, 7, &mut rng);
            let cell = &model.lower[0];
            assert!(cell.spread_lon >= 18.0 - 1e-9 && cell.spread_lon <= 22.0 + 1e-9);
            assert!(cell.spread_lat >= 9.0 - 1e-9 && cell.spread_lat <= 11.0 + 1e-9);
        }
    }

    #[test]
    fn fork_is_independent() {
        let original = PressureFieldModel::climatological(9, 1, 1.5);
        let mut copy = original.fork();
        let mut rng = SimRng::new(5);
        for _ in 0..10 {
            copy.step(9, &mut rng);
        }
        assert_ne!(copy, original);
        assert_eq!(original, PressureFieldModel::climatological(9, 1, 1.5));
    }
}

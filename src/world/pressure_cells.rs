use serde::{Deserialize, Serialize};

/// Vertical layer of the synthetic pressure field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Upper,
    Lower,
}

impl Layer {
    pub fn all() -> &'static [Layer] {
        &[Layer::Upper, Layer::Lower]
    }
}

/// Whether a cell is a high or a low. The sign of `strength` always follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    High,
    Low,
}

impl CellKind {
    pub fn sign(self) -> f64 {
        match self {
            CellKind::High => 1.0,
            CellKind::Low => -1.0,
        }
    }
}

/// Periodic "breathing" of a cell's horizontal spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    /// Current phase in radians
    pub phase: f64,
    /// Phase advance per tick in radians
    pub speed: f64,
    /// Fractional spread amplitude (0.1 = +/-10%)
    pub amplitude: f64,
    pub base_spread_lon: f64,
    pub base_spread_lat: f64,
}

/// A Gaussian pressure anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureCell {
    /// Longitude in degrees. Persistent cells live in [0, 360).
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Gaussian sigma along longitude, degrees
    pub spread_lon: f64,
    /// Gaussian sigma along latitude, degrees
    pub spread_lat: f64,
    /// Signed anomaly in hPa (positive = high)
    pub strength: f64,
    pub kind: CellKind,
    /// Eastward drift in degrees per tick
    pub drift_lon: f64,
    /// Northward drift in degrees per tick
    pub drift_lat: f64,
    pub oscillation: Option<Oscillation>,
    /// Spawned at runtime; decays and is removed instead of wrapping.
    pub transient: bool,
}

impl PressureCell {
    pub fn new(kind: CellKind, lon: f64, lat: f64, spread_lon: f64, spread_lat: f64, magnitude: f64) -> Self {
        Self {
            lon,
            lat,
            spread_lon,
            spread_lat,
            strength: kind.sign() * magnitude.abs(),
            kind,
            drift_lon: 0.0,
            drift_lat: 0.0,
            oscillation: None,
            transient: false,
        }
    }

    pub fn with_drift(mut self, drift_lon: f64, drift_lat: f64) -> Self {
        self.drift_lon = drift_lon;
        self.drift_lat = drift_lat;
        self
    }

    pub fn with_oscillation(mut self, speed: f64, amplitude: f64, phase: f64) -> Self {
        self.oscillation = Some(Oscillation {
            phase,
            speed,
            amplitude,
            base_spread_lon: self.spread_lon,
            base_spread_lat: self.spread_lat,
        });
        self
    }

    pub fn into_transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// Two independently tracked collections of pressure cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureFieldModel {
    pub upper: Vec<PressureCell>,
    pub lower: Vec<PressureCell>,
    /// Amplitude in hPa of the large-scale ambient noise term (0 disables it)
    pub noise_amplitude: f64,
    pub noise_seed: f32,
}

impl Default for PressureFieldModel {
    fn default() -> Self {
        Self {
            upper: Vec::new(),
            lower: Vec::new(),
            noise_amplitude: 0.0,
            noise_seed: 0.0,
        }
    }
}

impl PressureFieldModel {
    pub fn cells(&self, layer: Layer) -> &[PressureCell] {
        match layer {
            Layer::Upper => &self.upper,
            Layer::Lower => &self.lower,
        }
    }

    pub fn cells_mut(&mut self, layer: Layer) -> &mut Vec<PressureCell> {
        match layer {
            Layer::Upper => &mut self.upper,
            Layer::Lower => &mut self.lower,
        }
    }

    pub fn transient_count(&self, layer: Layer) -> usize {
        self.cells(layer).iter().filter(|c| c.transient).count()
    }
}

use serde::{Deserialize, Serialize};

use crate::world::names::Basin;

/// Wind thresholds (knots) at which radii are measured.
pub const RADII_THRESHOLDS_KT: [f64; 3] = [34.0, 50.0, 64.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StormStatus {
    Active,
    /// Terminal. No further steps are applied.
    Dissipated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtratropicalStage {
    None,
    /// Baroclinic redevelopment; `since` is the storm age in hours at entry.
    Developing { since: f64 },
    Decaying { since: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EyewallCycle {
    None,
    /// Outer eyewall contracting; intensity drops, circulation grows.
    Weakening { until: f64, reduction: f64 },
    /// New eyewall consolidating; circulation shrinks back.
    Recovering { until: f64 },
}

/// A temporary burst of environmental shear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShearEvent {
    pub until: f64,
    /// Extra shear in knots
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Quadrant {
    pub fn all() -> &'static [Quadrant] {
        &[
            Quadrant::NorthEast,
            Quadrant::SouthEast,
            Quadrant::SouthWest,
            Quadrant::NorthWest,
        ]
    }

    /// Bearing (degrees clockwise from north) where the quadrant starts.
    pub fn start_bearing(self) -> f64 {
        match self {
            Quadrant::NorthEast => 0.0,
            Quadrant::SouthEast => 90.0,
            Quadrant::SouthWest => 180.0,
            Quadrant::NorthWest => 270.0,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Radii in km, indexed `[threshold][quadrant]` following `RADII_THRESHOLDS_KT` and `Quadrant`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindRadii {
    pub radii: [[f64; 4]; 3],
}

impl WindRadii {
    pub fn get(&self, threshold: usize, quadrant: Quadrant) -> f64 {
        self.radii[threshold][quadrant.index()]
    }
}

/// Saffir-Simpson style classification by sustained wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    TropicalDepression,
    TropicalStorm,
    Category1,
    Category2,
    Category3,
    Category4,
    Category5,
}

impl Category {
    pub fn from_intensity(knots: f64) -> Category {
        if knots < 34.0 {
            Category::TropicalDepression
        } else if knots < 64.0 {
            Category::TropicalStorm
        } else if knots < 83.0 {
            Category::Category1
        } else if knots < 96.0 {
            Category::Category2
        } else if knots < 113.0 {
            Category::Category3
        } else if knots < 137.0 {
            Category::Category4
        } else {
            Category::Category5
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::TropicalDepression => "TD",
            Category::TropicalStorm => "TS",
            Category::Category1 => "C1",
            Category::Category2 => "C2",
            Category::Category3 => "C3",
            Category::Category4 => "C4",
            Category::Category5 => "C5",
        }
    }
}

/// One historical snapshot of the storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub age_hours: f64,
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
    pub pressure_hpa: f64,
    pub category: Category,
    pub extratropical: bool,
    pub subtropical: bool,
    pub monsoon: bool,
    pub eyewall_cycle: bool,
    pub wind_radii: WindRadii,
}

/// The evolving storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycloneState {
    /// Longitude in degrees, [-180, 180)
    pub lon: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Maximum sustained wind, knots
    pub intensity: f64,
    /// Direction of motion, degrees clockwise from north
    pub heading: f64,
    /// Translation speed, km/h
    pub speed: f64,
    pub age_hours: f64,
    /// Circulation radius, km
    pub size_km: f64,
    pub status: StormStatus,
    pub extratropical: ExtratropicalStage,
    /// Deadline (storm age in hours) for the subtropical phase to resolve
    pub subtropical_until: Option<f64>,
    /// Deadline for a monsoon depression to consolidate into a tropical cyclone
    pub monsoon_until: Option<f64>,
    pub eyewall_cycle: EyewallCycle,
    pub shear_event: Option<ShearEvent>,
    /// Accumulated cyclone energy, 1e4 kt^2
    pub ace: f64,
    pub name: Option<String>,
    pub basin: Basin,
    pub track: Vec<TrackPoint>,
}

impl CycloneState {
    pub fn new(lon: f64, lat: f64, intensity: f64, size_km: f64, basin: Basin) -> Self {
        Self {
            lon,
            lat,
            intensity,
            heading: 270.0,
            speed: 0.0,
            age_hours: 0.0,
            size_km,
            status: StormStatus::Active,
            extratropical: ExtratropicalStage::None,
            subtropical_until: None,
            monsoon_until: None,
            eyewall_cycle: EyewallCycle::None,
            shear_event: None,
            ace: 0.0,
            name: None,
            basin,
            track: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == StormStatus::Active
    }

    pub fn is_extratropical(&self) -> bool {
        !matches!(self.extratropical, ExtratropicalStage::None)
    }

    pub fn is_subtropical(&self) -> bool {
        self.subtropical_until.is_some()
    }

    pub fn is_monsoon_depression(&self) -> bool {
        self.monsoon_until.is_some()
    }

    /// +1 in the northern hemisphere, -1 in the southern.
    pub fn hemisphere(&self) -> f64 {
        if self.lat >= 0.0 { 1.0 } else { -1.0 }
    }

    pub fn category(&self) -> Category {
        Category::from_intensity(self.intensity)
    }

    /// Name if assigned, otherwise an unnamed depression labelled with its basin.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Depression ({:?})", self.basin))
    }

    pub fn latest(&self) -> Option<&TrackPoint> {
        self.track.last()
    }

    /// Peak intensity over the recorded track (or current intensity if the track is empty).
    pub fn peak_intensity(&self) -> f64 {
        self.track
            .iter()
            .map(|p| p.intensity)
            .fold(self.intensity, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_boundaries() {
        assert_eq!(Category::from_intensity(25.0), Category::TropicalDepression);
        assert_eq!(Category::from_intensity(34.0), Category::TropicalStorm);
        assert_eq!(Category::from_intensity(64.0), Category::Category1);
        assert_eq!(Category::from_intensity(100.0), Category::Category3);
        assert_eq!(Category::from_intensity(140.0), Category::Category5);
        assert!(Category::Category5 > Category::TropicalStorm);
    }

    #[test]
    fn new_storm_is_active_and_unnamed() {
        let storm = CycloneState::new(-45.0, 14.0, 25.0, 300.0, Basin::NorthAtlantic);
        assert!(storm.is_active());
        assert!(!storm.is_extratropical());
        assert!(!storm.is_subtropical());
        assert!(storm.name.is_none());
        assert_eq!(storm.hemisphere(), 1.0);
        assert_eq!(storm.peak_intensity(), 25.0);
    }

    #[test]
    fn display_name_falls_back_to_basin_label() {
        let mut storm = CycloneState::new(-45.0, 12.0, 25.0, 300.0, Basin::NorthAtlantic);
        assert_eq!(storm.display_name(), "Depression (NorthAtlantic)");
        storm.name = Some("Alberto".to_string());
        assert_eq!(storm.display_name(), "Alberto");
    }

    #[test]
    fn clone_does_not_share_track() {
        let mut storm = CycloneState::new(140.0, -12.0, 40.0, 300.0, Basin::Southern);
        storm.track.push(TrackPoint {
            age_hours: 0.0,
            lon: 140.0,
            lat: -12.0,
            intensity: 40.0,
            pressure_hpa: 995.0,
            category: Category::TropicalStorm,
            extratropical: false,
            subtropical: false,
            monsoon: false,
            eyewall_cycle: false,
            wind_radii: WindRadii::default(),
        });

        let mut copy = storm.clone();
        copy.track[0].wind_radii.radii[0][0] = 120.0;
        copy.track.push(copy.track[0].clone());

        assert_eq!(storm.track.len(), 1);
        assert_eq!(storm.track[0].wind_radii.radii[0][0], 0.0);
        assert_eq!(storm.hemisphere(), -1.0);
    }
}

//! Geostrophic-style winds from the pressure field and the deep-layer steering flow.

use glam::DVec2;

use crate::world::pressure_cells::{Layer, PressureFieldModel};

/// Eastward (x) and northward (y) wind in km/h.
pub type WindVector = DVec2;

pub const OMEGA: f64 = 7.292e-5;
pub const WIND_SCALE: f64 = 1.5e-3;
/// Finite-difference half width, degrees.
const H_DEG: f64 = 1.0;
const MIN_COS_LAT: f64 = 0.05;
pub const UPPER_WEIGHT: f64 = 0.7;
pub const LOWER_WEIGHT: f64 = 0.3;
pub const KMH_PER_KT: f64 = 1.852;

/// Coriolis parameter with its magnitude floored at the 5-degree value.
/// The equator counts as northern hemisphere.
pub fn coriolis(lat: f64) -> f64 {
    let f_min = 2.0 * OMEGA * 5.0_f64.to_radians().sin();
    let f = 2.0 * OMEGA * lat.to_radians().sin();
    if f.abs() >= f_min {
        f
    } else if lat >= 0.0 {
        f_min
    } else {
        -f_min
    }
}

/// Wind at a point in one layer from central pressure differences.
pub fn layer_wind(model: &PressureFieldModel, lon: f64, lat: f64, layer: Layer) -> WindVector {
    let cos_lat = lat.to_radians().cos().max(MIN_COS_LAT);
    let dp_dx = (model.pressure_at(lon + H_DEG, lat, layer) - model.pressure_at(lon - H_DEG, lat, layer))
        / (2.0 * H_DEG * cos_lat);
    let dp_dy = (model.pressure_at(lon, lat + H_DEG, layer) - model.pressure_at(lon, lat - H_DEG, layer))
        / (2.0 * H_DEG);
    let f = coriolis(lat);
    DVec2::new(-WIND_SCALE * dp_dy / f, WIND_SCALE * dp_dx / f)
}

/// Poleward and westward self-propagation of a vortex on the beta plane.
pub fn beta_drift(lat: f64) -> WindVector {
    let hemisphere = if lat >= 0.0 { 1.0 } else { -1.0 };
    let c = lat.to_radians().cos();
    DVec2::new(-4.0 * c, 5.0 * c * hemisphere)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub flow: WindVector,
    /// Upper minus lower layer wind
    pub shear: WindVector,
}

/// Deep-layer mean flow plus beta drift and an external bias, and the layer shear.
pub fn steering(model: &PressureFieldModel, lon: f64, lat: f64, bias: WindVector) -> Steering {
    let upper = layer_wind(model, lon, lat, Layer::Upper);
    let lower = layer_wind(model, lon, lat, Layer::Lower);
    Steering {
        flow: upper * UPPER_WEIGHT + lower * LOWER_WEIGHT + beta_drift(lat) + bias,
        shear: upper - lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::pressure_cells::{CellKind, PressureCell};

    #[test]
    fn coriolis_is_floored_and_signed() {
        let f5 = coriolis(5.0);
        assert_eq!(coriolis(0.0), f5);
        assert_eq!(coriolis(1.0), f5);
        assert_eq!(coriolis(-1.0), -f5);
        assert!(coriolis(30.0) > f5);
        assert!(coriolis(-30.0) < -f5);
    }

    #[test]
    fn flat_field_only_beta_drift() {
        let model = PressureFieldModel::default();
        let s = steering(&model, 140.0, 15.0, DVec2::ZERO);
        assert_eq!(s.shear, DVec2::ZERO);
        assert_eq!(s.flow, beta_drift(15.0));
        assert!(s.flow.x < 0.0 && s.flow.y > 0.0, "NH beta drift is north-west");
        assert!(beta_drift(-15.0).y < 0.0, "SH beta drift is south-west");
    }

    #[test]
    fn flow_is_clockwise_around_northern_high() {
        let model = PressureFieldModel {
            lower: vec![PressureCell::new(CellKind::High, 0.0, 30.0, 10.0, 10.0, 20.0)],
            ..Default::default()
        };
        // South of a NH high the flow is easterly
        let south = layer_wind(&model, 0.0, 25.0, Layer::Lower);
        assert!(south.x < 0.0, "Expected easterlies south of the high, got {:?}", south);
        // North of it, westerly
        let north = layer_wind(&model, 0.0, 35.0, Layer::Lower);
        assert!(north.x > 0.0);
    }

    #[test]
    fn bias_is_added_to_flow() {
        let model = PressureFieldModel::climatological(9, 4, 0.0);
        let plain = steering(&model, -50.0, 20.0, DVec2::ZERO);
        let biased = steering(&model, -50.0, 20.0, DVec2::new(3.0, -2.0));
        assert!((biased.flow - plain.flow - DVec2::new(3.0, -2.0)).length() < 1e-9);
        assert_eq!(biased.shear, plain.shear);
    }

    #[test]
    fn equator_wind_is_finite() {
        let model = PressureFieldModel::climatological(9, 4, 1.5);
        let w = layer_wind(&model, 100.0, 0.0, Layer::Upper);
        assert!(w.x.is_finite() && w.y.is_finite());
    }
}

//! Spherical geometry helpers for storm motion and wind-field sampling.
//!
//! Coordinate convention: x=cos(lat)*cos(lon), y=cos(lat)*sin(lon), z=sin(lat).
//! Bearings are degrees clockwise from north.

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.2;
/// Floor on cos(lat) when converting eastward distance to degrees of longitude.
pub const MIN_COS_LAT: f64 = 0.05;
pub const MAX_ABS_LAT: f64 = 89.0;

/// Great-circle angular distance between two points on a unit sphere (in radians).
/// Points given as (lat, lon) in degrees.
pub fn angular_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (x1, y1, z1) = lat_lon_to_xyz(lat1, lon1);
    let (x2, y2, z2) = lat_lon_to_xyz(lat2, lon2);
    let dot = (x1 * x2 + y1 * y2 + z1 * z2).clamp(-1.0, 1.0);
    dot.acos()
}

/// Great-circle distance in km.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    angular_distance(lat1, lon1, lat2, lon2) * EARTH_RADIUS_KM
}

/// Convert a tangent-plane vector (east, north) to a bearing in degrees (0=N, 90=E, 180=S, 270=W).
pub fn tangent_to_bearing(east: f64, north: f64) -> f64 {
    let bearing = east.atan2(north).to_degrees();
    ((bearing % 360.0) + 360.0) % 360.0
}

/// Longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can return exactly 360 for tiny negative inputs
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Longitude into [0, 360).
pub fn wrap_lon_360(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest longitude difference `a - b`, in [-180, 180).
pub fn shortest_lon_delta(a: f64, b: f64) -> f64 {
    normalize_lon(a - b)
}

/// Signed smallest rotation from bearing `from` to bearing `to`, in [-180, 180).
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_lon(to - from)
}

/// Move `distance_km` along a bearing with the flat-earth step the storm model uses.
/// Returns (lat, lon) with lon in [-180, 180) and lat clamped to +/-89.
pub fn advance_along_heading(lat: f64, lon: f64, heading_deg: f64, distance_km: f64) -> (f64, f64) {
    let heading = heading_deg.to_radians();
    let dlat = distance_km * heading.cos() / KM_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().max(MIN_COS_LAT);
    let dlon = distance_km * heading.sin() / (KM_PER_DEGREE * cos_lat);
    let new_lat = (lat + dlat).clamp(-MAX_ABS_LAT, MAX_ABS_LAT);
    (new_lat, normalize_lon(lon + dlon))
}

/// Point at `distance_km` and `bearing_deg` from a centre, same flat-earth step.
/// Used for sampling rings around the storm.
pub fn offset_point(lat: f64, lon: f64, bearing_deg: f64, distance_km: f64) -> (f64, f64) {
    advance_along_heading(lat, lon, bearing_deg, distance_km)
}

/// Convert lat/lon (degrees) to unit sphere coordinates (x, y, z).
pub fn lat_lon_to_xyz(lat: f64, lon: f64) -> (f64, f64, f64) {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    (
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn angular_distance_pole_to_equator() {
        let dist = angular_distance(90.0, 0.0, 0.0, 0.0);
        assert!(
            (dist - PI / 2.0).abs() < EPSILON,
            "Pole to equator should be pi/2, got {}",
            dist
        );
    }

    #[test]
    fn angular_distance_same_point() {
        let dist = angular_distance(45.0, 90.0, 45.0, 90.0);
        assert!(dist.abs() < EPSILON, "Same point should be 0, got {}", dist);
    }

    #[test]
    fn angular_distance_across_date_line() {
        let dist = distance_km(0.0, 179.5, 0.0, -179.5);
        assert!(
            (dist - 111.19).abs() < 0.5,
            "One degree across the date line should be ~111 km, got {}",
            dist
        );
    }

    #[test]
    fn tangent_to_bearing_cardinals() {
        assert!(tangent_to_bearing(0.0, 1.0).abs() < EPSILON);
        assert!((tangent_to_bearing(1.0, 0.0) - 90.0).abs() < EPSILON);
        assert!((tangent_to_bearing(0.0, -1.0) - 180.0).abs() < EPSILON);
        assert!((tangent_to_bearing(-1.0, 0.0) - 270.0).abs() < EPSILON);
    }

    #[test]
    fn normalize_lon_range() {
        for lon in [-540.0, -180.0, -1e-15, 0.0, 179.999, 180.0, 359.0, 720.5] {
            let n = normalize_lon(lon);
            assert!((-180.0..180.0).contains(&n), "{} normalized to {}", lon, n);
        }
        assert_eq!(normalize_lon(180.0), -180.0);
        assert!((normalize_lon(190.0) + 170.0).abs() < EPSILON);
    }

    #[test]
    fn wrap_lon_360_range() {
        assert!((wrap_lon_360(-10.0) - 350.0).abs() < EPSILON);
        assert_eq!(wrap_lon_360(360.0), 0.0);
        assert!(wrap_lon_360(-1e-15) < 360.0);
    }

    #[test]
    fn shortest_delta_wraps() {
        assert!((shortest_lon_delta(-179.0, 179.0) - 2.0).abs() < EPSILON);
        assert!((shortest_lon_delta(179.0, -179.0) + 2.0).abs() < EPSILON);
        assert!((angle_difference(350.0, 10.0) - 20.0).abs() < EPSILON);
        assert!((angle_difference(10.0, 350.0) + 20.0).abs() < EPSILON);
    }

    #[test]
    fn advance_northward_one_degree() {
        let (lat, lon) = advance_along_heading(10.0, 20.0, 0.0, KM_PER_DEGREE);
        assert!((lat - 11.0).abs() < EPSILON);
        assert!((lon - 20.0).abs() < EPSILON);
    }

    #[test]
    fn advance_westward_crosses_date_line() {
        let (lat, lon) = advance_along_heading(0.0, -179.5, 270.0, KM_PER_DEGREE);
        assert!(lat.abs() < EPSILON);
        assert!((lon - 179.5).abs() < EPSILON, "Expected wrap to 179.5, got {}", lon);
    }

    #[test]
    fn advance_clamps_latitude() {
        let (lat, _) = advance_along_heading(88.5, 0.0, 0.0, 500.0);
        assert_eq!(lat, MAX_ABS_LAT);
    }

    #[test]
    fn unit_sphere_points_have_unit_length() {
        for (lat, lon) in [(0.0, 0.0), (45.0, 135.0), (-30.0, -60.0), (89.0, 180.0)] {
            let (x, y, z) = lat_lon_to_xyz(lat, lon);
            assert!(((x * x + y * y + z * z) - 1.0).abs() < EPSILON);
            assert!((z - f64::to_radians(lat).sin()).abs() < EPSILON);
        }
    }
}

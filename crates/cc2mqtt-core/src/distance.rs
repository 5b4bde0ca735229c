//! Great-circle distance.

use crate::snapshot::Coordinate;

/// Mean Earth radius in kilometers (IUGG).
const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Distance in kilometers between two coordinates, using the haversine
/// formula.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let sin_dlat = (delta_lat / 2.0).sin();
    let sin_dlon = (delta_lon / 2.0).sin();
    let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Rounding can push `a` marginally past 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!(distance_km(origin, origin).abs() < f64::EPSILON);
    }

    #[test]
    fn one_degree_of_latitude() {
        // ~111km per degree of latitude
        let d = distance_km(Coordinate::new(56.0, 9.0), Coordinate::new(57.0, 9.0));
        assert!((d - 111.2).abs() < 0.5);
    }

    #[test]
    fn symmetric() {
        let home = Coordinate::new(56.0, 9.0);
        let car = Coordinate::new(55.676, 12.568);
        let there = distance_km(home, car);
        let back = distance_km(car, home);
        assert!((there - back).abs() < 1e-9);
        assert!(there > 200.0 && there < 240.0);
    }

    #[test]
    fn antipodal_points() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }
}

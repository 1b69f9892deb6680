use std::f64::consts::{PI, TAU};

use super::waypoint::Waypoint;

// ---------------------------------------------------------------------------
// Great-circle navigation
// ---------------------------------------------------------------------------
// Two distinct sphere radii are in use: point-to-point distances ride on the
// 6371 km mean radius, the destination projection on 6372797.560856 m. They
// come from different formula sources and are kept separate deliberately —
// unifying them would shift waypoint-advance and circling geometry.

/// Mean earth radius for point-to-point distances, in meters.
const DISTANCE_RADIUS: f64 = 6_371_000.0;

/// Earth radius used by the destination-point projection, in meters.
const PROJECTION_RADIUS: f64 = 6_372_797.560_856;

/// Mean earth radius for the haversine reporting helper, in kilometers.
const HAVERSINE_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in meters
/// (spherical law of cosines).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let l1 = lat1.to_radians();
    let l2 = lat2.to_radians();
    let dg = (lon2 - lon1).to_radians();

    let cos_central = l1.sin() * l2.sin() + l1.cos() * l2.cos() * dg.cos();
    // rounding can push the cosine a hair outside [-1, 1]
    DISTANCE_RADIUS * cos_central.clamp(-1.0, 1.0).acos()
}

/// Initial bearing from the first to the second coordinate, in radians
/// normalized to `[0, 2π)`.
pub fn course_radians(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let l1 = lat1.to_radians();
    let l2 = lat2.to_radians();
    let dg = (lon2 - lon1).to_radians();

    let y = dg.sin() * l2.cos();
    let x = l1.cos() * l2.sin() - l1.sin() * l2.cos() * dg.cos();

    (y.atan2(x) + TAU) % TAU
}

/// Initial bearing from the first to the second coordinate, in degrees
/// normalized to `[0, 360)`.
pub fn course_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    course_radians(lat1, lon1, lat2, lon2).to_degrees()
}

/// Destination point reached from `start` on the given initial bearing
/// (degrees) after the given distance (meters). Direct spherical solution;
/// the longitude comes back normalized to `(-180, 180]`.
pub fn destination_point(start: Waypoint, bearing_deg: f64, distance_m: f64) -> Waypoint {
    let lat1 = start.latitude.to_radians();
    let lon1 = start.longitude.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_m / PROJECTION_RADIUS;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());
    let lon2 = PI - (PI - lon2).rem_euclid(TAU);

    Waypoint::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Difference `target − current` between two courses in degrees, wrapped to
/// the shorter turn direction: the result lies in `[-180, 180]`, negative
/// meaning a left turn.
pub fn course_error_degrees(target: f64, current: f64) -> f64 {
    let mut error = target - current;
    if error.abs() > 180.0 {
        if error < -180.0 {
            error += 360.0;
        } else {
            error -= 360.0;
        }
    }
    error
}

/// Haversine distance between two coordinates in kilometers. Reporting
/// helper; the control path uses [`distance_meters`].
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    HAVERSINE_RADIUS_KM * c
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

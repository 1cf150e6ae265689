//! Spherical-earth bearing and projection helpers.
//!
//! All functions take and return degrees; radians are only used internally.

use crate::LatLon;
use tracing::trace;

/// Mean earth radius in meters used by every calculation in this module.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// Initial great-circle bearing from `from` to `to`, in [0, 360).
///
/// Identical points give 0.
pub fn calculate_bearing(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.lat().to_radians();
    let lon1 = from.lon().to_radians();
    let lat2 = to.lat().to_radians();
    let lon2 = to.lon().to_radians();
    let d_lon = lon2 - lon1;

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Returns `(bearing - offset, bearing + offset)` for the bearing from `from` to `to`.
///
/// The pair is deliberately left unnormalized.
pub fn calculate_bearing_angles(from: LatLon, to: LatLon, offset_deg: f64) -> (f64, f64) {
    let bearing = calculate_bearing(from, to);
    (bearing - offset_deg, bearing + offset_deg)
}

/// Destination point `radius_m` meters from `center` along `angle_deg`.
///
/// A negative radius projects the opposite way. The result longitude is not
/// wrapped, and distances beyond roughly half the earth's circumference are
/// not meaningful.
pub fn calculate_point_on_circle(center: LatLon, radius_m: f64, angle_deg: f64) -> LatLon {
    let center_lat = center.lat().to_radians();
    let center_lon = center.lon().to_radians();
    let radius_rad = radius_m / EARTH_RADIUS;
    let angle_rad = angle_deg.to_radians();

    let sin_lat = center_lat.sin() * radius_rad.cos()
        + center_lat.cos() * radius_rad.sin() * angle_rad.cos();
    // Rounding can push the argument just past ±1.
    let lat_rad = sin_lat.clamp(-1.0, 1.0).asin();

    let lon_rad = center_lon
        + (angle_rad.sin() * radius_rad.sin() * center_lat.cos())
            .atan2(radius_rad.cos() - center_lat.sin() * lat_rad.sin());

    LatLon::new(lat_rad.to_degrees(), lon_rad.to_degrees())
}

/// Continues the direction of travel from `reference` to `moving` by
/// `distance_m` meters past `moving`.
pub fn move_point_forward(reference: LatLon, moving: LatLon, distance_m: f64) -> LatLon {
    let bearing = calculate_bearing(reference, moving);
    let moved = calculate_point_on_circle(moving, distance_m, bearing);
    trace!("moved {moving} by {distance_m} m at {bearing}° to {moved}");
    moved
}

/// Great-circle distance in meters on the same sphere as the projections.
pub fn haversine_distance(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon() - a.lon()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}

/// Folds a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

use anyhow::{bail, Context};
use geo::algorithm::geodesic_destination::GeodesicDestination;
use road_detect::geo_utils::{calculate_point_on_circle, haversine_distance};
use road_detect::LatLon;

// Compares the spherical projection with the ellipsoidal one from `geo`.
// Usage: project_point "38.247250, 21.738974" 25 138.86
fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let [start, dist, az] = args.as_slice() else {
        bail!("usage: project_point <LAT,LON> <DISTANCE_M> <BEARING_DEG>");
    };

    let start = start
        .parse::<LatLon>()
        .with_context(|| format!("invalid start '{start}'"))?;
    let dist = dist
        .parse::<f64>()
        .with_context(|| format!("invalid distance '{dist}'"))?;
    let az = az
        .parse::<f64>()
        .with_context(|| format!("invalid bearing '{az}'"))?;

    let sphere = calculate_point_on_circle(start, dist, az);
    let ellipsoid = LatLon::from(geo::Point::from(start).geodesic_destination(az, dist));
    println!("Spherical destination   {sphere}");
    println!("Ellipsoidal destination {ellipsoid}");
    println!("Difference {} m", haversine_distance(sphere, ellipsoid));

    Ok(())
}

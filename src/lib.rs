//! Bearing and projection helpers for working out which road a moving
//! point is on, plus a road-snapping client to name the candidate roads.

pub mod detect;
pub mod geo_utils;
mod lat_lon;
pub mod roads;

pub use detect::{detect_road, Detection, DetectionParams, RoadOutcome};
pub use lat_lon::{LatLon, ParseLatLonError};
pub use roads::{GoogleRoadResolver, RoadPair, RoadResolver, RoadsConfig, RoadsError};

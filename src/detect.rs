use crate::geo_utils::{calculate_bearing_angles, calculate_point_on_circle, move_point_forward};
use crate::roads::RoadResolver;
use crate::LatLon;
use std::fmt;
use tracing::{debug, info};

/// Geometric settings used when looking for the road ahead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParams {
    pub step_m: f64,
    pub search_radius_m: f64,
    pub offset_deg: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            step_m: 25.0,
            search_radius_m: 25.0,
            offset_deg: 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoadOutcome {
    Target(String),
    Ambiguous(String, String),
    Unresolved,
}

impl RoadOutcome {
    fn from_roads(first: &str, second: &str) -> Self {
        match (first.is_empty(), second.is_empty()) {
            (true, true) => RoadOutcome::Unresolved,
            (true, false) => RoadOutcome::Target(second.to_string()),
            (false, true) => RoadOutcome::Target(first.to_string()),
            (false, false) if first == second => RoadOutcome::Target(first.to_string()),
            (false, false) => RoadOutcome::Ambiguous(first.to_string(), second.to_string()),
        }
    }
}

impl fmt::Display for RoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadOutcome::Target(road) => write!(f, "The target road is: {road}"),
            RoadOutcome::Ambiguous(first, second) => {
                write!(f, "We have 2 roads: {first} and {second}")
            }
            RoadOutcome::Unresolved => f.write_str("No road could be resolved"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub moved: LatLon,
    pub search_points: (LatLon, LatLon),
    pub roads: (String, String),
    pub outcome: RoadOutcome,
}

/// Extrapolates the track `previous -> current` one step ahead, probes two
/// points either side of the heading and asks `resolver` which roads they are on.
pub fn detect_road<R: RoadResolver + ?Sized>(
    previous: LatLon,
    current: LatLon,
    resolver: &R,
    params: &DetectionParams,
) -> Detection {
    let moved = move_point_forward(previous, current, params.step_m);
    let (left, right) = calculate_bearing_angles(previous, moved, params.offset_deg);
    let search_points = (
        calculate_point_on_circle(moved, params.search_radius_m, left),
        calculate_point_on_circle(moved, params.search_radius_m, right),
    );
    debug!(
        "search points {} ({left}°) and {} ({right}°)",
        search_points.0, search_points.1
    );

    let roads = resolver.nearest_roads(search_points.0, search_points.1);
    let outcome = RoadOutcome::from_roads(&roads.0, &roads.1);
    info!("roads '{}' and '{}': {outcome}", roads.0, roads.1);

    Detection {
        moved,
        search_points,
        roads,
        outcome,
    }
}

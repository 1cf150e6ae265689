use itertools::Itertools;
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;
use thiserror::Error;

/// A geographical point in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseLatLonError {
    #[error("expected two comma separated values, found {0}")]
    FieldCount(usize),
    #[error("invalid {field} '{value}': {source}")]
    Number {
        field: &'static str,
        value: String,
        source: ParseFloatError,
    },
    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Returns the same point with its longitude folded into [-180, 180).
    pub fn wrapped(&self) -> Self {
        Self::new(self.lat, crate::geo_utils::normalize_longitude(self.lon))
    }
}

fn parse_field(
    field: &'static str,
    value: &str,
    limit: f64,
) -> Result<f64, ParseLatLonError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|source| ParseLatLonError::Number {
            field,
            value: value.to_string(),
            source,
        })?;
    // NaN fails both comparisons, so it is rejected here as well.
    if !(parsed >= -limit && parsed <= limit) {
        return Err(ParseLatLonError::OutOfRange {
            field,
            value: parsed,
            min: -limit,
            max: limit,
        });
    }
    Ok(parsed)
}

impl FromStr for LatLon {
    type Err = ParseLatLonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(',').map(str::trim).collect::<Vec<_>>();
        let Some((lat, lon)) = fields.iter().collect_tuple() else {
            return Err(ParseLatLonError::FieldCount(fields.len()));
        };

        let lat = parse_field("latitude", lat, 90.0)?;
        let lon = parse_field("longitude", lon, 180.0)?;
        Ok(Self::new(lat, lon))
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl From<LatLon> for geo::Point {
    fn from(point: LatLon) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl From<geo::Point> for LatLon {
    fn from(point: geo::Point) -> Self {
        LatLon::new(point.y(), point.x())
    }
}

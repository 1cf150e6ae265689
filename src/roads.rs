//! Road name lookup for snapped coordinates.
//!
//! The detection logic only needs [`RoadResolver`]; [`GoogleRoadResolver`] is
//! the implementation backed by the Google Maps Roads and Geocoding APIs.

use crate::LatLon;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_ROADS_URL: &str = "https://roads.googleapis.com/v1/nearestRoads";
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Road names for a pair of points, in input order. An empty string means
/// the road could not be resolved.
pub type RoadPair = (String, String);

/// Maps two coordinates to the names of their nearest roads.
pub trait RoadResolver {
    fn nearest_roads(&self, a: LatLon, b: LatLon) -> RoadPair;
}

#[derive(Debug, Error)]
pub enum RoadsError {
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API returned {status}: {message}")]
    Api { status: String, message: String },
}

#[derive(Clone, Debug)]
pub struct RoadsConfig {
    pub api_key: String,
    pub roads_url: String,
    pub geocode_url: String,
    pub timeout: Duration,
}

impl RoadsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            roads_url: DEFAULT_ROADS_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearestRoadsResponse {
    #[serde(default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnappedPoint {
    original_index: usize,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Picks the place ids snapped from input points 0 and 1.
fn parse_snapped_points(body: &str) -> Result<(Option<String>, Option<String>), RoadsError> {
    let response: NearestRoadsResponse = serde_json::from_str(body)?;

    let mut ids = (None, None);
    for point in response.snapped_points {
        match point.original_index {
            0 => ids.0 = Some(point.place_id),
            1 => ids.1 = Some(point.place_id),
            _ => {}
        }
    }
    Ok(ids)
}

/// Name of the first `route` component of the first geocoding result.
fn parse_route_name(body: &str) -> Result<Option<String>, RoadsError> {
    let response: GeocodeResponse = serde_json::from_str(body)?;
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" | "" => {}
        _ => {
            return Err(RoadsError::Api {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            })
        }
    }

    let name = response.results.into_iter().next().and_then(|result| {
        result
            .address_components
            .into_iter()
            .find(|comp| comp.types.iter().any(|t| t == "route"))
            .map(|comp| comp.long_name)
    });
    Ok(name)
}

/// Copy of `url` with the `key` query parameter dropped, for logging.
fn without_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs = url
        .query_pairs()
        .filter(|(name, _)| name != "key")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();
    redacted.set_query(None);
    if !pairs.is_empty() {
        redacted.query_pairs_mut().extend_pairs(pairs);
    }
    redacted
}

/// [`RoadResolver`] that snaps points with the Roads API and names the
/// snapped places with the Geocoding API.
#[derive(Debug)]
pub struct GoogleRoadResolver {
    config: RoadsConfig,
    client: Client,
}

impl GoogleRoadResolver {
    pub fn new(config: RoadsConfig) -> Result<Self, RoadsError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::new_with_client(config, client))
    }

    /// Create a resolver sharing an existing `reqwest` client.
    pub fn new_with_client(config: RoadsConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn nearest_roads_url(&self, a: LatLon, b: LatLon) -> Result<Url, RoadsError> {
        let points = format!("{}|{}", a.wrapped(), b.wrapped());
        let url = Url::parse_with_params(
            &self.config.roads_url,
            &[("points", points.as_str()), ("key", self.config.api_key.as_str())],
        )?;
        Ok(url)
    }

    fn geocode_url(&self, place_id: &str) -> Result<Url, RoadsError> {
        let url = Url::parse_with_params(
            &self.config.geocode_url,
            &[("place_id", place_id), ("key", self.config.api_key.as_str())],
        )?;
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<String, RoadsError> {
        debug!("GET {}", without_key(&url));
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(body)
    }

    fn snap(&self, a: LatLon, b: LatLon) -> Result<(Option<String>, Option<String>), RoadsError> {
        let body = self.get(self.nearest_roads_url(a, b)?)?;
        parse_snapped_points(&body)
    }

    fn road_name(&self, place_id: &str) -> Result<Option<String>, RoadsError> {
        let body = self.get(self.geocode_url(place_id)?)?;
        parse_route_name(&body)
    }

    fn resolve(&self, place_id: Option<&str>) -> String {
        let Some(place_id) = place_id else {
            return String::new();
        };
        match self.road_name(place_id) {
            Ok(Some(name)) => name,
            Ok(None) => {
                debug!("place id {place_id} has no route component");
                String::new()
            }
            Err(e) => {
                warn!("failed to resolve place id {place_id}: {e}");
                String::new()
            }
        }
    }
}

impl RoadResolver for GoogleRoadResolver {
    fn nearest_roads(&self, a: LatLon, b: LatLon) -> RoadPair {
        let (id_a, id_b) = match self.snap(a, b) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("nearest roads lookup failed: {e}");
                return (String::new(), String::new());
            }
        };
        (self.resolve(id_a.as_deref()), self.resolve(id_b.as_deref()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    // Serves `count` requests on a local port, answering each with
    // `respond(request_target) -> (status, body)`.
    fn serve(
        count: usize,
        respond: fn(&str) -> (u16, String),
    ) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut targets = Vec::new();
            for stream in listener.incoming().take(count) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .to_string();
                let (status, body) = respond(&target);
                write!(
                    stream,
                    "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
                targets.push(target);
            }
            targets
        });
        (base, handle)
    }

    fn stub_resolver(base: &str) -> GoogleRoadResolver {
        let mut config = RoadsConfig::new("secret");
        config.roads_url = format!("{base}/roads");
        config.geocode_url = format!("{base}/geocode");
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        GoogleRoadResolver::new_with_client(config, client)
    }

    fn resolver(config: RoadsConfig) -> GoogleRoadResolver {
        GoogleRoadResolver::new_with_client(config, Client::new())
    }

    #[test]
    fn snapped_points_by_original_index() {
        let body = r#"{
            "snappedPoints": [
                {"location": {"latitude": 38.2, "longitude": 21.7}, "originalIndex": 1, "placeId": "second"},
                {"location": {"latitude": 38.2, "longitude": 21.7}, "originalIndex": 0, "placeId": "first"},
                {"location": {"latitude": 38.2, "longitude": 21.7}, "originalIndex": 0, "placeId": "first-alt"}
            ]
        }"#;
        let ids = parse_snapped_points(body).unwrap();
        assert_eq!(ids, (Some("first-alt".to_string()), Some("second".to_string())));
    }

    #[test]
    fn snapped_points_missing_index() {
        let body = r#"{"snappedPoints": [{"originalIndex": 1, "placeId": "only"}]}"#;
        assert_eq!(parse_snapped_points(body).unwrap(), (None, Some("only".to_string())));
        assert_eq!(parse_snapped_points("{}").unwrap(), (None, None));
    }

    #[test]
    fn snapped_points_malformed() {
        assert!(matches!(parse_snapped_points("not json"), Err(RoadsError::Json(_))));
        let body = r#"{"snappedPoints": [{"originalIndex": 0}]}"#;
        assert!(matches!(parse_snapped_points(body), Err(RoadsError::Json(_))));
    }

    #[test]
    fn route_name_from_first_result() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"address_components": [
                    {"long_name": "12", "short_name": "12", "types": ["street_number"]},
                    {"long_name": "Korinthou", "short_name": "Korinthou", "types": ["route"]},
                    {"long_name": "Patra", "short_name": "Patra", "types": ["locality", "political"]}
                ]},
                {"address_components": [
                    {"long_name": "Other Road", "types": ["route"]}
                ]}
            ]
        }"#;
        assert_eq!(parse_route_name(body).unwrap(), Some("Korinthou".to_string()));
    }

    #[test]
    fn route_name_absent() {
        let body = r#"{"status": "OK", "results": [{"address_components": [
            {"long_name": "Patra", "types": ["locality"]}
        ]}]}"#;
        assert_eq!(parse_route_name(body).unwrap(), None);

        let body = r#"{"status": "ZERO_RESULTS", "results": []}"#;
        assert_eq!(parse_route_name(body).unwrap(), None);
    }

    #[test]
    fn route_name_api_error() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "results": []}"#;
        let err = parse_route_name(body).unwrap_err();
        assert!(matches!(err, RoadsError::Api { ref status, .. } if status == "REQUEST_DENIED"));
        assert!(err.to_string().contains("API key is invalid"));
    }

    #[test]
    fn nearest_roads_url_encodes_points() {
        let resolver = resolver(RoadsConfig::new("secret"));
        let url = resolver
            .nearest_roads_url(LatLon::new(38.5, 21.25), LatLon::new(-1.0, 190.0))
            .unwrap();
        assert_eq!(url.host_str(), Some("roads.googleapis.com"));
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("points".to_string(), "38.5,21.25|-1,-170".to_string()),
                ("key".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn geocode_url_has_place_id() {
        let resolver = resolver(RoadsConfig::new("secret"));
        let url = resolver.geocode_url("ChIJ&x").unwrap();
        assert_eq!(url.path(), "/maps/api/geocode/json");
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(pairs[0], ("place_id".to_string(), "ChIJ&x".to_string()));
        assert_eq!(pairs[1], ("key".to_string(), "secret".to_string()));
    }

    #[test]
    fn bad_endpoint_degrades_to_empty_names() {
        let mut config = RoadsConfig::new("secret");
        config.roads_url = "not a url".to_string();
        let roads = resolver(config).nearest_roads(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.1));
        assert_eq!(roads, (String::new(), String::new()));
    }

    #[test]
    fn missing_place_id_is_empty() {
        let resolver = resolver(RoadsConfig::new("secret"));
        assert_eq!(resolver.resolve(None), "");
    }

    #[test]
    fn failed_geocode_only_blanks_its_road() {
        let (base, server) = serve(3, |target| {
            if target.starts_with("/roads") {
                let body = r#"{"snappedPoints": [
                    {"originalIndex": 0, "placeId": "A"},
                    {"originalIndex": 1, "placeId": "B"}
                ]}"#;
                (200, body.to_string())
            } else if target.contains("place_id=A") {
                let body = r#"{"status": "OK", "results": [{"address_components": [
                    {"long_name": "Korinthou", "types": ["route"]}
                ]}]}"#;
                (200, body.to_string())
            } else {
                (500, r#"{"status": "UNKNOWN_ERROR", "results": []}"#.to_string())
            }
        });

        let roads = stub_resolver(&base).nearest_roads(LatLon::new(38.2, 21.7), LatLon::new(38.3, 21.8));
        assert_eq!(roads, ("Korinthou".to_string(), String::new()));

        let targets = server.join().unwrap();
        assert!(targets[0].starts_with("/roads?points="));
        assert!(targets[1].contains("place_id=A"));
        assert!(targets[2].contains("place_id=B"));
    }

    #[test]
    fn failed_snap_blanks_both_roads() {
        let (base, server) = serve(1, |_| (503, "unavailable".to_string()));
        let roads = stub_resolver(&base).nearest_roads(LatLon::new(38.2, 21.7), LatLon::new(38.3, 21.8));
        assert_eq!(roads, (String::new(), String::new()));
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn logged_url_drops_key() {
        let resolver = resolver(RoadsConfig::new("secret"));
        let url = without_key(&resolver.geocode_url("ChIJ").unwrap());
        assert_eq!(url.as_str(), "https://maps.googleapis.com/maps/api/geocode/json?place_id=ChIJ");

        let url = Url::parse("http://localhost/x?key=secret").unwrap();
        assert_eq!(without_key(&url).as_str(), "http://localhost/x");
    }
}

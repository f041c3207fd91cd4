//! Node feed ingestion
//!
//! The feed is a JSON array of raw node records:
//!
//! ```json
//! [{"id": "LEO-41", "type": "satellite",
//!   "position": {"lat": 12.1, "lon": 101.3, "alt": 550000},
//!   "sat_type": "LEO",
//!   "orbit": {"inclination": 53, "raan": 40, "period": 5700, "eccentricity": 0.001},
//!   "orbit_state": {"last_theta": 0.93}}]
//! ```
//!
//! Ingestion fails fast: the first bad record aborts the whole batch with an
//! error naming it, so a refresh never leaves the store half-updated.

use orbital_mechanics::{GeoPosition, Orbit, OrbitClass, OrbitState};
use serde::Deserialize;
use tracing::info;

use crate::node::{Node, Satellite};
use crate::{Result, TopologyError};

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    position: Option<RawPosition>,
    sat_type: Option<String>,
    orbit: Option<RawOrbit>,
    orbit_state: Option<RawOrbitState>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawOrbit {
    inclination: f64,
    raan: f64,
    period: f64,
    #[serde(default)]
    eccentricity: f64,
}

#[derive(Debug, Deserialize)]
struct RawOrbitState {
    #[serde(default)]
    last_theta: f64,
}

/// Parse a node feed document into typed nodes
pub fn parse_feed(json: &str) -> Result<Vec<Node>> {
    let raw: Vec<RawNode> = serde_json::from_str(json)?;
    let mut nodes = Vec::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        let node = convert(record).map_err(|(id, reason)| TopologyError::MalformedFeed {
            index,
            id,
            reason,
        })?;

        if nodes.iter().any(|n: &Node| n.id == node.id) {
            return Err(TopologyError::DuplicateNode(node.id));
        }
        nodes.push(node);
    }

    info!(
        "Parsed node feed: {} nodes ({} satellites)",
        nodes.len(),
        nodes.iter().filter(|n| n.as_satellite().is_some()).count()
    );
    Ok(nodes)
}

fn convert(raw: RawNode) -> std::result::Result<Node, (String, String)> {
    let id = raw.id;
    let fail = |reason: String| (id.clone(), reason);

    if id.trim().is_empty() {
        return Err(fail("empty id".to_string()));
    }

    let pos = raw
        .position
        .ok_or_else(|| fail("missing position".to_string()))?;
    let (lat, lon) = match (pos.lat, pos.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(fail("position needs both lat and lon".to_string())),
    };
    let position =
        GeoPosition::new(lat, lon, pos.alt.unwrap_or(0.0)).map_err(|e| fail(e.to_string()))?;

    match raw.kind.to_ascii_lowercase().as_str() {
        "groundstation" | "ground_station" | "ground-station" => {
            Ok(Node::ground_station(id, position))
        }
        "seastation" | "sea_station" | "sea-station" => Ok(Node::sea_station(id, position)),
        "satellite" => {
            let class = match raw.sat_type.as_deref().map(str::to_ascii_uppercase) {
                None => OrbitClass::Leo,
                Some(s) if s == "LEO" => OrbitClass::Leo,
                Some(s) if s == "MEO" => OrbitClass::Meo,
                Some(s) if s == "GEO" => OrbitClass::Geo,
                Some(other) => return Err(fail(format!("unknown sat_type {}", other))),
            };
            let orbit = raw
                .orbit
                .ok_or_else(|| fail("satellite without orbit data".to_string()))?;
            let orbit = Orbit::new(
                orbit.inclination,
                orbit.raan,
                orbit.period,
                orbit.eccentricity,
                position.altitude_m,
            )
            .map_err(|e| fail(e.to_string()))?;
            let state = OrbitState::new(raw.orbit_state.map(|s| s.last_theta).unwrap_or(0.0));

            Ok(Node::satellite(id, Satellite::new(orbit, class, state, position)))
        }
        other => Err(fail(format!("unknown node type {}", other))),
    }
}

//! Node variants
//!
//! Each kind carries exactly the fields it needs. Satellite sub-points are
//! derived from orbital state and can only change through [`Satellite::propagate`].

use orbital_mechanics::{propagate, GeoPosition, Orbit, OrbitClass, OrbitState};
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    GroundStation { position: GeoPosition },
    SeaStation { position: GeoPosition },
    Satellite(Satellite),
    RequestMarker { position: GeoPosition },
}

impl Node {
    pub fn ground_station(id: impl Into<String>, position: GeoPosition) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::GroundStation { position },
        }
    }

    pub fn sea_station(id: impl Into<String>, position: GeoPosition) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::SeaStation { position },
        }
    }

    pub fn satellite(id: impl Into<String>, satellite: Satellite) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Satellite(satellite),
        }
    }

    pub fn request_marker(id: impl Into<String>, position: GeoPosition) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::RequestMarker { position },
        }
    }

    /// Current geographic position (derived for satellites)
    pub fn position(&self) -> GeoPosition {
        match &self.kind {
            NodeKind::GroundStation { position }
            | NodeKind::SeaStation { position }
            | NodeKind::RequestMarker { position } => *position,
            NodeKind::Satellite(sat) => sat.sub_point(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::GroundStation { .. } => "ground_station",
            NodeKind::SeaStation { .. } => "sea_station",
            NodeKind::Satellite(_) => "satellite",
            NodeKind::RequestMarker { .. } => "request_marker",
        }
    }

    pub fn is_request_marker(&self) -> bool {
        matches!(self.kind, NodeKind::RequestMarker { .. })
    }

    pub fn as_satellite(&self) -> Option<&Satellite> {
        match &self.kind {
            NodeKind::Satellite(sat) => Some(sat),
            _ => None,
        }
    }
}

/// Satellite orbital data. Fields are private so the sub-point cannot be
/// written except by propagation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Satellite {
    orbit: Orbit,
    class: OrbitClass,
    state: OrbitState,
    sub_point: GeoPosition,
}

impl Satellite {
    /// `sub_point` is the position reported alongside `state` by the feed.
    pub fn new(orbit: Orbit, class: OrbitClass, state: OrbitState, sub_point: GeoPosition) -> Self {
        Self {
            orbit,
            class,
            state,
            sub_point,
        }
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    pub fn class(&self) -> OrbitClass {
        self.class
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn sub_point(&self) -> GeoPosition {
        self.sub_point
    }

    /// Advance by `dt_s` simulated seconds. Returns whether anything moved.
    pub fn propagate(&mut self, dt_s: f64) -> Result<bool> {
        let out = propagate(&self.orbit, self.class, self.state, self.sub_point, dt_s)?;
        let moved = out.state != self.state;
        self.state = out.state;
        self.sub_point = out.sub_point;
        Ok(moved)
    }
}

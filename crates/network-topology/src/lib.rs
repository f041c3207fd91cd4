//! Network Topology Library
//!
//! Holds the simulated network: ground stations, sea stations, satellites and
//! request markers, plus the paths the allocator routes through them.
//!
//! Writers are split by concern:
//! - the [`SimulationClock`] propagates satellite nodes,
//! - the request lifecycle manager inserts/removes request markers and paths,
//! - the node feed replaces infrastructure nodes on refresh.
//!
//! No two writers touch the same field.

use orbital_mechanics::OrbitalError;
use thiserror::Error;

pub mod clock;
pub mod feed;
pub mod node;
pub mod path;
pub mod store;

pub use clock::{ClockConfig, SimulationClock, TickReport};
pub use feed::parse_feed;
pub use node::{Node, NodeKind, Satellite};
pub use path::{Path, PathSegment, DEFAULT_PATH_COLOR};
pub use store::{RenderNode, TopologyStore};

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("Malformed node feed entry #{index} ({id}): {reason}")]
    MalformedFeed {
        index: usize,
        id: String,
        reason: String,
    },
    #[error("Node feed JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid clock configuration: {0}")]
    InvalidClock(String),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
}

pub type Result<T> = std::result::Result<T, TopologyError>;

//! Paths through the network
//!
//! A path references nodes by id only. Lookups can miss transiently (a node
//! not loaded yet, or already removed); such segments are skipped.

use orbital_mechanics::Point3;
use serde::{Deserialize, Serialize};

/// Display color for allocator-provided paths
pub const DEFAULT_PATH_COLOR: u32 = 0x00ff88;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    /// Shares its id with the originating request
    pub id: String,
    /// Source → hops → destination
    pub nodes: Vec<String>,
    /// 24-bit RGB
    pub color: u32,
    pub active: bool,
}

impl Path {
    pub fn new(id: impl Into<String>, nodes: Vec<String>) -> Self {
        Self {
            id: id.into(),
            nodes,
            color: DEFAULT_PATH_COLOR,
            active: true,
        }
    }

    /// Consecutive node-id pairs
    pub fn hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

/// One resolved segment of an active path, in model space
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub path_id: String,
    pub from: Point3,
    pub to: Point3,
    pub color: u32,
}

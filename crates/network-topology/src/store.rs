//! Topology store
//!
//! Insertion-ordered node list and path list. Small (hundreds of nodes), so
//! lookups are linear like the station registry this grew out of.

use orbital_mechanics::{GeoPosition, Point3};
use serde::Serialize;
use tracing::{debug, warn};

use crate::node::{Node, NodeKind};
use crate::path::{Path, PathSegment};
use crate::{Result, TopologyError};

/// Node projected into model space for the renderer
#[derive(Debug, Clone, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub kind: &'static str,
    pub point: [f64; 3],
}

#[derive(Debug, Default)]
pub struct TopologyStore {
    nodes: Vec<Node>,
    paths: Vec<Path>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(256),
            paths: Vec::new(),
        }
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut store = Self::new();
        store.load_infrastructure(nodes)?;
        Ok(store)
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub fn get(&self, id: &str) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.to_string()))
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn satellites(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.as_satellite().is_some())
    }

    pub fn request_markers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_request_marker())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replace every ground/sea/satellite node with `nodes`.
    ///
    /// Request markers are owned by the request lifecycle and survive a
    /// refresh. An infrastructure node colliding with a live marker id is
    /// rejected before anything changes.
    pub fn load_infrastructure(&mut self, nodes: Vec<Node>) -> Result<usize> {
        for (i, node) in nodes.iter().enumerate() {
            if node.is_request_marker() {
                return Err(TopologyError::MalformedFeed {
                    index: i,
                    id: node.id.clone(),
                    reason: "request markers cannot come from the node feed".to_string(),
                });
            }
            if nodes[..i].iter().any(|n| n.id == node.id)
                || self.request_markers().any(|m| m.id == node.id)
            {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }
        }

        let loaded = nodes.len();
        self.nodes.retain(|n| n.is_request_marker());
        let markers = std::mem::replace(&mut self.nodes, nodes);
        self.nodes.extend(markers);

        debug!("Loaded {} infrastructure nodes", loaded);
        Ok(loaded)
    }

    pub fn insert_request_marker(&mut self, id: &str, position: GeoPosition) -> Result<()> {
        if self.contains(id) {
            return Err(TopologyError::DuplicateNode(id.to_string()));
        }
        self.nodes.push(Node::request_marker(id, position));
        Ok(())
    }

    /// Remove a request marker. Infrastructure nodes are never removed here.
    pub fn remove_request_marker(&mut self, id: &str) -> Option<Node> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id && n.is_request_marker())?;
        Some(self.nodes.remove(idx))
    }

    /// Propagate every satellite by `dt_s` simulated seconds.
    /// Returns how many satellites moved.
    pub fn propagate_satellites(&mut self, dt_s: f64) -> Result<usize> {
        let mut moved = 0;
        for node in self.nodes.iter_mut() {
            if let NodeKind::Satellite(sat) = &mut node.kind {
                if sat.propagate(dt_s)? {
                    moved += 1;
                }
            }
        }
        Ok(moved)
    }

    // ========================================================================
    // Paths
    // ========================================================================

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter()
    }

    pub fn path(&self, id: &str) -> Option<&Path> {
        self.paths.iter().find(|p| p.id == id)
    }

    /// Add a path, replacing any existing path with the same id
    pub fn add_path(&mut self, path: Path) {
        if let Some(existing) = self.paths.iter_mut().find(|p| p.id == path.id) {
            warn!("Replacing existing path {}", path.id);
            *existing = path;
        } else {
            self.paths.push(path);
        }
    }

    pub fn remove_path(&mut self, id: &str) -> Option<Path> {
        let idx = self.paths.iter().position(|p| p.id == id)?;
        Some(self.paths.remove(idx))
    }

    /// Flip a path's visibility. Returns the new `active` flag.
    pub fn toggle_path(&mut self, id: &str) -> Result<bool> {
        let path = self
            .paths
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TopologyError::PathNotFound(id.to_string()))?;
        path.active = !path.active;
        Ok(path.active)
    }

    // ========================================================================
    // Render-space projection
    // ========================================================================

    pub fn render_nodes(&self) -> Vec<RenderNode> {
        self.nodes
            .iter()
            .map(|n| {
                let p = n.position().to_model();
                RenderNode {
                    id: n.id.clone(),
                    kind: n.kind_name(),
                    point: [p.x, p.y, p.z],
                }
            })
            .collect()
    }

    /// Segments of every active path. Hops whose endpoints are missing are
    /// skipped.
    pub fn path_segments(&self) -> Vec<PathSegment> {
        let mut segments = Vec::new();

        for path in self.paths.iter().filter(|p| p.active) {
            for (from, to) in path.hops() {
                match (self.model_point(from), self.model_point(to)) {
                    (Some(a), Some(b)) => segments.push(PathSegment {
                        path_id: path.id.clone(),
                        from: a,
                        to: b,
                        color: path.color,
                    }),
                    _ => debug!("Skipping segment {} -> {} of path {}", from, to, path.id),
                }
            }
        }

        segments
    }

    fn model_point(&self, id: &str) -> Option<Point3> {
        self.node(id).map(|n| n.position().to_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Satellite;
    use orbital_mechanics::{Orbit, OrbitClass, OrbitState};

    fn gs(id: &str, lat: f64, lon: f64) -> Node {
        Node::ground_station(id, GeoPosition::surface(lat, lon).unwrap())
    }

    fn sat(id: &str, class: OrbitClass) -> Node {
        let orbit = Orbit::new(53.0, 0.0, 5400.0, 0.0, 550_000.0).unwrap();
        Node::satellite(
            id,
            Satellite::new(
                orbit,
                class,
                OrbitState::new(0.0),
                GeoPosition::new(0.0, 0.0, 550_000.0).unwrap(),
            ),
        )
    }

    fn store() -> TopologyStore {
        TopologyStore::with_nodes(vec![
            gs("GS_Beijing", 39.9, 116.4),
            gs("GS_HCM", 10.8, 106.6),
            sat("LEO-41", OrbitClass::Leo),
            sat("GEO-02", OrbitClass::Geo),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_missing_node() {
        let store = store();
        assert!(store.get("GS_HCM").is_ok());
        assert!(matches!(store.get("nope"), Err(TopologyError::NodeNotFound(_))));
    }

    #[test]
    fn test_propagate_skips_geostationary() {
        let mut store = store();
        let geo_before = store.get("GEO-02").unwrap().position();

        assert_eq!(store.propagate_satellites(60.0).unwrap(), 1);
        assert_eq!(store.get("GEO-02").unwrap().position(), geo_before);
        assert_eq!(store.propagate_satellites(0.0).unwrap(), 0);
    }

    #[test]
    fn test_request_marker_lifecycle() {
        let mut store = store();
        let origin = GeoPosition::surface(21.0, 105.8).unwrap();

        store.insert_request_marker("req_a", origin).unwrap();
        assert!(matches!(
            store.insert_request_marker("req_a", origin),
            Err(TopologyError::DuplicateNode(_))
        ));
        assert_eq!(store.request_markers().count(), 1);

        assert!(store.remove_request_marker("req_a").is_some());
        assert!(store.remove_request_marker("req_a").is_none());
        // infrastructure is not removable through the marker API
        assert!(store.remove_request_marker("GS_HCM").is_none());
    }

    #[test]
    fn test_refresh_keeps_request_markers() {
        let mut store = store();
        store
            .insert_request_marker("req_a", GeoPosition::surface(1.0, 1.0).unwrap())
            .unwrap();

        store.load_infrastructure(vec![gs("GS_Sydney", -33.9, 151.2)]).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.contains("req_a"));
        assert!(store.contains("GS_Sydney"));
        assert!(!store.contains("GS_HCM"));
    }

    #[test]
    fn test_refresh_rejects_duplicates() {
        let mut store = store();
        let result = store.load_infrastructure(vec![gs("A", 0.0, 0.0), gs("A", 1.0, 1.0)]);
        assert!(matches!(result, Err(TopologyError::DuplicateNode(_))));
        // nothing changed
        assert!(store.contains("GS_HCM"));
    }

    #[test]
    fn test_path_segments_skip_missing_nodes() {
        let mut store = store();
        store.add_path(Path::new(
            "req_x",
            vec![
                "req_x".into(),
                "LEO-41".into(),
                "GS_HCM".into(),
                "GS_Beijing".into(),
            ],
        ));

        // req_x marker not inserted: first hop is skipped
        let segments = store.path_segments();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.path_id == "req_x"));

        assert!(!store.toggle_path("req_x").unwrap());
        assert!(store.path_segments().is_empty());
        assert!(store.toggle_path("missing").is_err());
    }

    #[test]
    fn test_render_nodes_on_sphere() {
        let store = store();
        let render = store.render_nodes();
        assert_eq!(render.len(), 4);

        let hcm = render.iter().find(|r| r.id == "GS_HCM").unwrap();
        let r = (hcm.point[0].powi(2) + hcm.point[1].powi(2) + hcm.point[2].powi(2)).sqrt();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(hcm.kind, "ground_station");
    }
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use orbital_mechanics::{unit_sphere_to_geo, GeoPosition, Point3};
use request_lifecycle::{qos, ManualOverrides, QosProfile, Request, ServiceClass};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::sim_state::{AutoClassPolicy, ConsoleState, SimSnapshot};
use crate::AppState;

// ============================================================================
// DTOs
// ============================================================================

/// Partial console update; absent fields stay as they are
#[derive(Debug, Default, Deserialize)]
pub struct ConsoleUpdate {
    pub selected_class: Option<ServiceClass>,
    pub manual_mode: Option<bool>,
    pub manual: Option<ManualOverrides>,
    pub auto_generate: Option<bool>,
    pub auto_class_policy: Option<AutoClassPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct ClockUpdate {
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: Request,
    /// Seconds until expiry, connected requests only
    pub remaining_s: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PathView {
    pub id: String,
    pub nodes: Vec<String>,
    pub color: u32,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct SegmentView {
    pub path_id: String,
    pub from: [f64; 3],
    pub to: [f64; 3],
    pub color: u32,
}

#[derive(Debug, Serialize)]
pub struct RenderView {
    pub nodes: Vec<network_topology::RenderNode>,
    pub segments: Vec<SegmentView>,
}

/// Point in the globe's local frame, as hit by a screen pick
#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PickResponse {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub id: String,
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct QosEntry {
    pub code: u8,
    pub name: &'static str,
    pub profile: QosProfile,
}

// ============================================================================
// Router
// ============================================================================

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/console", get(get_console).put(update_console))
        .route("/clock", put(update_clock))
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", delete(clear_request))
        .route("/paths", get(list_paths))
        .route("/paths/:id/toggle", post(toggle_path))
        .route("/nodes", get(list_nodes))
        .route("/render", get(render))
        .route("/stats", get(stats))
        .route("/pick", post(pick))
        .route("/qos", get(qos_catalog))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_console(State(state): State<AppState>) -> Json<ConsoleState> {
    Json(state.sim.read().await.console.clone())
}

pub async fn update_console(
    State(state): State<AppState>,
    Json(update): Json<ConsoleUpdate>,
) -> ApiResult<Json<ConsoleState>> {
    if let Some(m) = &update.manual {
        GeoPosition::new(m.lat, m.lon, m.alt).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    }

    let mut sim = state.sim.write().await;
    let console = &mut sim.console;
    if let Some(class) = update.selected_class {
        console.selected_class = class;
    }
    if let Some(manual_mode) = update.manual_mode {
        console.manual_mode = manual_mode;
    }
    if let Some(manual) = update.manual {
        console.manual = manual;
    }
    if let Some(auto) = update.auto_generate {
        if auto != console.auto_generate {
            info!("Auto-generation {}", if auto { "enabled" } else { "disabled" });
        }
        console.auto_generate = auto;
    }
    if let Some(policy) = update.auto_class_policy {
        console.auto_class_policy = policy;
    }

    Ok(Json(console.clone()))
}

pub async fn update_clock(
    State(state): State<AppState>,
    Json(update): Json<ClockUpdate>,
) -> Json<SimSnapshot> {
    let mut sim = state.sim.write().await;
    if update.running {
        sim.clock.start();
    } else {
        sim.clock.stop();
    }
    Json(sim.snapshot())
}

pub async fn list_requests(State(state): State<AppState>) -> Json<Vec<RequestView>> {
    let sim = state.sim.read().await;
    let views = sim
        .requests
        .requests()
        .iter()
        .map(|r| RequestView {
            request: r.clone(),
            remaining_s: sim.requests.remaining_time(&r.id).map(|d| d.as_secs_f64()),
        })
        .collect();
    Json(views)
}

/// Generate and submit a request from the current console settings
pub async fn create_request(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<RequestView>)> {
    let mut sim = state.sim.write().await;
    let id = sim.generate_from_console()?;
    let request = sim
        .requests
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::Internal(format!("request {} vanished", id)))?;

    Ok((
        StatusCode::CREATED,
        Json(RequestView {
            request,
            remaining_s: None,
        }),
    ))
}

pub async fn clear_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ClearResponse> {
    let cleared = state.sim.write().await.clear(&id);
    Json(ClearResponse { id, cleared })
}

pub async fn list_paths(State(state): State<AppState>) -> Json<Vec<PathView>> {
    let sim = state.sim.read().await;
    let paths = sim
        .store
        .paths()
        .map(|p| PathView {
            id: p.id.clone(),
            nodes: p.nodes.clone(),
            color: p.color,
            active: p.active,
        })
        .collect();
    Json(paths)
}

pub async fn toggle_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let mut guard = state.sim.write().await;
    let sim = &mut *guard;
    let active = sim.requests.toggle_path(&mut sim.store, &id)?;
    Ok(Json(ToggleResponse { id, active }))
}

pub async fn list_nodes(State(state): State<AppState>) -> Json<Vec<network_topology::Node>> {
    Json(state.sim.read().await.store.nodes().cloned().collect())
}

pub async fn render(State(state): State<AppState>) -> Json<RenderView> {
    let sim = state.sim.read().await;
    let segments = sim
        .store
        .path_segments()
        .into_iter()
        .map(|s| SegmentView {
            path_id: s.path_id,
            from: [s.from.x, s.from.y, s.from.z],
            to: [s.to.x, s.to.y, s.to.z],
            color: s.color,
        })
        .collect();

    Json(RenderView {
        nodes: sim.store.render_nodes(),
        segments,
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<SimSnapshot> {
    Json(state.sim.read().await.snapshot())
}

pub async fn pick(Json(point): Json<PickRequest>) -> ApiResult<Json<PickResponse>> {
    if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
        return Err(ApiError::InvalidInput("pick point must be finite".into()));
    }
    let (lat, lon) = unit_sphere_to_geo(&Point3::new(point.x, point.y, point.z));
    Ok(Json(PickResponse { lat, lon }))
}

pub async fn qos_catalog() -> Json<Vec<QosEntry>> {
    Json(
        qos::catalog()
            .map(|(class, profile)| QosEntry {
                code: class.code(),
                name: class.name(),
                profile: *profile,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_state::testing::simulation;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request as HttpRequest};
    use orbital_mechanics::geo_to_unit_sphere;
    use request_lifecycle::AllocationResult;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, AppState) {
        let (sim, _allocator, _rx) = simulation();
        let state = AppState {
            sim: sim.into_shared(),
        };
        (api_routes(state.clone()), state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = HttpRequest::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_console_update_and_generate() {
        let (app, _state) = app();

        let (status, console) = call(
            &app,
            Method::PUT,
            "/console",
            Some(json!({
                "selected_class": 8,
                "manual_mode": true,
                "manual": {"lat": 21.0, "lon": 105.8, "timeout_s": 120}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(console["selected_class"], 8);
        assert_eq!(console["manual"]["alt"], 0.0);

        let (status, created) = call(&app, Method::POST, "/requests", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["class"], 8);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["demand_timeout_s"], 120);
        assert!(created["id"].as_str().unwrap().starts_with("req_"));

        let (_, list) = call(&app, Method::GET, "/requests", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_console_rejects_bad_manual_position() {
        let (app, _state) = app();
        let (status, body) = call(
            &app,
            Method::PUT,
            "/console",
            Some(json!({"manual": {"lat": 95.0, "lon": 0.0, "timeout_s": 10}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_toggle_and_clear() {
        let (app, state) = app();
        let (_, created) = call(&app, Method::POST, "/requests", None).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::POST, &format!("/paths/{}/toggle", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.sim.write().await.apply_result(AllocationResult {
            id: id.clone(),
            result: "success".into(),
            path: Some(vec!["LEO-41".into(), "GS_HCM".into()]),
            allocated: None,
        });

        let (_, render) = call(&app, Method::GET, "/render", None).await;
        assert_eq!(render["segments"].as_array().unwrap().len(), 2);

        let (status, toggled) = call(&app, Method::POST, &format!("/paths/{}/toggle", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["active"], false);
        let (_, render) = call(&app, Method::GET, "/render", None).await;
        assert!(render["segments"].as_array().unwrap().is_empty());

        let (_, cleared) = call(&app, Method::DELETE, &format!("/requests/{}", id), None).await;
        assert_eq!(cleared["cleared"], true);
        let (_, cleared) = call(&app, Method::DELETE, &format!("/requests/{}", id), None).await;
        assert_eq!(cleared["cleared"], false);

        let (_, paths) = call(&app, Method::GET, "/paths", None).await;
        assert!(paths.as_array().unwrap().is_empty());
        let (_, stats) = call(&app, Method::GET, "/stats", None).await;
        assert_eq!(stats["lifecycle"]["cleared"], 1);
        assert_eq!(stats["nodes"], 3);
    }

    #[tokio::test]
    async fn test_pick_inverts_projection() {
        let (app, _state) = app();
        let p = geo_to_unit_sphere(21.03, 105.85, 1.0);
        let (status, body) = call(
            &app,
            Method::POST,
            "/pick",
            Some(json!({"x": p.x, "y": p.y, "z": p.z})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["lat"].as_f64().unwrap() - 21.03).abs() < 1e-6);
        assert!((body["lon"].as_f64().unwrap() - 105.85).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_nodes_and_clock() {
        let (app, _state) = app();
        let (_, nodes) = call(&app, Method::GET, "/nodes", None).await;
        let nodes = nodes.as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().any(|n| n["type"] == "satellite"));

        let (_, snapshot) = call(&app, Method::PUT, "/clock", Some(json!({"running": false}))).await;
        assert_eq!(snapshot["clock_running"], false);

        let (_, qos) = call(&app, Method::GET, "/qos", None).await;
        assert_eq!(qos.as_array().unwrap().len(), 8);
    }
}

/**
 * API REST SERVMON - Serveur HTTP du kernel
 *
 * RÔLE :
 * Expose le moteur de simulation au dashboard : snapshot, alertes, logs,
 * suggestions, seuils, plus le flux WebSocket `/ws`.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum (port 3001 par défaut)
 * - Routes : /health, /system/health, /api/..., /ws
 * - CORS totalement ouvert via middleware (OPTIONS → 204)
 * - Verrou moteur pris et relâché dans le handler, jamais à travers un await
 *
 * ERREURS :
 * - Alerte inconnue (ou id non numérique) → 404 {"error": "Alert not found"}
 * - Query invalide (limit non numérique) → 400 par l'extracteur axum
 */

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use servmon_engine::{
    Alert, EngineError, LogEntry, LogFilter, Monitor, Snapshot, Suggestion, Thresholds, ThresholdsUpdate,
};
use tracing::info;

use crate::health::{HealthTracker, KernelHealth};
use crate::state::SharedEngine;
use crate::ws::{ws_handler, BroadcastHub};

const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub hub: BroadcastHub,
    pub health_tracker: HealthTracker,
}

#[derive(Serialize)]
struct ThresholdsUpdated {
    success: bool,
    thresholds: Thresholds,
}

async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    response
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/api/metrics", get(get_metrics))
        .route("/api/alerts", get(get_alerts))
        .route("/api/alerts/{id}/acknowledge", post(acknowledge_alert))
        .route("/api/logs", get(get_logs))
        .route("/api/optimization-suggestions", get(get_suggestions))
        .route("/api/thresholds", get(get_thresholds).post(update_thresholds))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        .layer(middleware::from_fn(cors))
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.engine, &app.hub))
}

// GET /api/metrics (snapshot, vue limitée)
async fn get_metrics(State(app): State<AppState>) -> Json<Snapshot> {
    Json(app.engine.lock().snapshot())
}

// GET /api/alerts (liste complète)
async fn get_alerts(State(app): State<AppState>) -> Json<Vec<Alert>> {
    Json(app.engine.lock().alerts())
}

// POST /api/alerts/{id}/acknowledge
async fn acknowledge_alert(State(app): State<AppState>, Path(id): Path<String>) -> Response {
    let result = match id.parse::<u64>() {
        Ok(id) => app.engine.lock().acknowledge_alert(id),
        Err(_) => Err(EngineError::AlertNotFound(0)),
    };

    match result {
        Ok(()) => {
            info!(alert_id = %id, "[http] alerte acquittée");
            Json(json!({ "success": true })).into_response()
        }
        Err(EngineError::AlertNotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "Alert not found" }))).into_response()
        }
    }
}

// GET /api/logs?level=&limit=
async fn get_logs(State(app): State<AppState>, Query(filter): Query<LogFilter>) -> Json<Vec<LogEntry>> {
    Json(app.engine.lock().logs(&filter))
}

// GET /api/optimization-suggestions
async fn get_suggestions(State(app): State<AppState>) -> Json<Vec<Suggestion>> {
    Json(app.engine.lock().optimization_suggestions())
}

// GET /api/thresholds
async fn get_thresholds(State(app): State<AppState>) -> Json<Thresholds> {
    Json(app.engine.lock().thresholds())
}

// POST /api/thresholds (mise à jour partielle)
async fn update_thresholds(
    State(app): State<AppState>,
    Json(update): Json<ThresholdsUpdate>,
) -> Json<ThresholdsUpdated> {
    let thresholds = app.engine.lock().update_thresholds(update);
    info!(?thresholds, "[http] seuils mis à jour");
    Json(ThresholdsUpdated { success: true, thresholds })
}

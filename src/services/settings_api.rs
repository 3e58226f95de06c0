// Settings API Service
// Loopback HTTP endpoint that reads and writes the settings file

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::settings_manager::{SettingsError, SettingsManager};

pub const SETTINGS_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const SETTINGS_BASE_PORT: u16 = 8001;
pub const SETTINGS_PORT_TRIES: u16 = 20;
const PROBE_TIMEOUT_SECS: u64 = 3;

/// First port in `start..start + tries` that can be bound on `host`
///
/// Falls back to `start` when every candidate is taken.
pub fn find_free_port(host: IpAddr, start: u16, tries: u16) -> u16 {
    for port in start..start.saturating_add(tries) {
        if std::net::TcpListener::bind((host, port)).is_ok() {
            return port;
        }
    }
    log::warn!("No free port in {start}..{}, reusing {start}", start.saturating_add(tries));
    start
}

/// Public URL of the settings resource for a bound address
pub fn settings_url(addr: SocketAddr) -> String {
    format!("http://{addr}/settings")
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| {
                    ["http://localhost:", "http://127.0.0.1:"]
                        .iter()
                        .any(|prefix| origin.starts_with(prefix))
                })
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn settings_router(manager: Arc<SettingsManager>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/settings", get(read_settings).post(write_settings))
        .with_state(manager)
        .layer(build_cors_layer())
}

async fn index() -> impl IntoResponse {
    Json(json!({ "ok": true, "routes": ["/settings"] }))
}

/// GET /settings - Current file contents
async fn read_settings(State(manager): State<Arc<SettingsManager>>) -> Response {
    match manager.read_raw() {
        Ok(value) => Json(value).into_response(),
        Err(SettingsError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Config file not found" })),
        )
            .into_response(),
        Err(e) => {
            log::warn!("Settings API read failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// POST /settings - Overwrite the file with the request body
async fn write_settings(State(manager): State<Arc<SettingsManager>>, body: Bytes) -> Response {
    let result = serde_json::from_slice::<Value>(&body)
        .map_err(|e| SettingsError::Invalid(e.to_string()))
        .and_then(|value| manager.write_raw(&value));

    match result {
        Ok(()) => {
            log::info!("Settings file replaced through the settings API");
            Json(json!({ "message": "Settings saved successfully" })).into_response()
        }
        Err(e) => {
            log::warn!("Settings API write failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Bind the settings endpoint on loopback, scanning for a free port
pub async fn bind_settings_api(start: u16, tries: u16) -> std::io::Result<TcpListener> {
    let port = find_free_port(SETTINGS_HOST, start, tries);
    TcpListener::bind(SocketAddr::new(SETTINGS_HOST, port)).await
}

/// Serve the endpoint on `listener` until the process exits
pub fn spawn_settings_api(listener: TcpListener, manager: Arc<SettingsManager>) -> JoinHandle<()> {
    let app = settings_router(manager);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Settings API stopped: {e}");
        }
    })
}

/// Whether the endpoint behind `settings_url` answers on its root path
pub async fn check_settings_api(settings_url: &str) -> bool {
    let root = settings_url.replace("/settings", "/");
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Failed to create HTTP client: {e}");
            return false;
        }
    };

    match client.get(&root).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            log::debug!("Settings API probe failed: {e}");
            false
        }
    }
}

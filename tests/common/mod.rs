// Mock Icecast server for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

pub const ADMIN_AUTH: &str = "Basic YWRtaW46aGFja21l"; // admin:hackme
pub const SOURCE_AUTH: &str = "Basic c291cmNlOnNyY3Bhc3M="; // source:srcpass

#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Body of /status-json.xsl; `None` answers 404
    pub status_json: Option<Value>,
    pub json_content_type: &'static str,
    pub xml_status: StatusCode,
    pub admin_status: StatusCode,
    /// Authorization headers /admin/metadata accepts
    pub accepted_auth: Vec<&'static str>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            status_json: None,
            json_content_type: "application/json",
            xml_status: StatusCode::OK,
            admin_status: StatusCode::UNAUTHORIZED,
            accepted_auth: vec![ADMIN_AUTH],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub params: HashMap<String, String>,
    pub authorization: Option<String>,
}

struct MockState {
    config: MockConfig,
    metadata_requests: Mutex<Vec<MetadataRequest>>,
    status_hits: Mutex<usize>,
}

pub struct MockIcecast {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockIcecast {
    pub async fn start(config: MockConfig) -> Self {
        let state = Arc::new(MockState {
            config,
            metadata_requests: Mutex::new(Vec::new()),
            status_hits: Mutex::new(0),
        });

        let app = Router::new()
            .route("/status-json.xsl", get(status_json))
            .route("/status.xsl", get(status_xml))
            .route("/admin", get(admin))
            .route("/admin/metadata", get(metadata))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn metadata_requests(&self) -> Vec<MetadataRequest> {
        self.state.metadata_requests.lock().unwrap().clone()
    }

    pub fn status_hits(&self) -> usize {
        *self.state.status_hits.lock().unwrap()
    }
}

/// A port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn status_json(State(state): State<Arc<MockState>>) -> Response {
    *state.status_hits.lock().unwrap() += 1;
    match &state.config.status_json {
        Some(body) => (
            [(header::CONTENT_TYPE, state.config.json_content_type)],
            body.to_string(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn status_xml(State(state): State<Arc<MockState>>) -> Response {
    (state.config.xml_status, "<icestats/>").into_response()
}

async fn admin(State(state): State<Arc<MockState>>) -> Response {
    state.config.admin_status.into_response()
}

async fn metadata(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let accepted = authorization
        .as_deref()
        .map(|auth| state.config.accepted_auth.iter().any(|accepted| *accepted == auth))
        .unwrap_or(false);

    state.metadata_requests.lock().unwrap().push(MetadataRequest {
        params,
        authorization,
    });

    if accepted {
        (StatusCode::OK, "Metadata update successful").into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

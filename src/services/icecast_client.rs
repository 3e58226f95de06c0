// Icecast Client Service
// Talks to the Icecast status and admin endpoints

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Settings, StatusPayload};
use super::mount_resolver::is_mount_active;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// User Icecast accepts with the source password on admin endpoints
pub const SOURCE_USER: &str = "source";

/// Errors from a single best-effort request to the server
#[derive(Error, Debug)]
pub enum StatusError {
    /// Connection refused, timeout, DNS failure
    #[error("Server unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server responded with status {status}")]
    Http { status: StatusCode },

    /// The body could not be read as the expected JSON
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl StatusError {
    pub fn is_transport(&self) -> bool {
        matches!(self, StatusError::Transport(_))
    }
}

/// Host and port of an Icecast server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.host(), settings.port_number())
    }

    /// Absolute URL for `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

/// Which status page confirmed the server is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionProbe {
    JsonStatus,
    XmlStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Everything needed to push stream metadata to a mount
#[derive(Debug, Clone)]
pub struct MetadataUpdate {
    pub mount: String,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub admin: Credentials,
    pub source_password: String,
}

impl MetadataUpdate {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mount: settings.mount(),
            title: settings.stream_title.trim().to_string(),
            description: settings.stream_description.trim().to_string(),
            genre: settings.stream_genre.trim().to_string(),
            admin: Credentials {
                user: settings.admin_user.trim().to_string(),
                password: settings.admin_password.clone(),
            },
            source_password: settings.source_password.clone(),
        }
    }

    fn song_params(&self) -> Vec<(&'static str, String)> {
        let song = if self.title.is_empty() {
            "Untitled".to_string()
        } else {
            self.title.clone()
        };
        vec![
            ("mount", self.mount.clone()),
            ("mode", "updinfo".to_string()),
            ("song", song),
        ]
    }

    fn info_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("mount", self.mount.clone()), ("mode", "updmeta".to_string())];
        for (key, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("genre", &self.genre),
        ] {
            if !value.is_empty() {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

/// Final state of one metadata call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataCall {
    pub status: StatusCode,
    /// The admin attempt got a 401 and the call was repeated as the source user
    pub retried_as_source: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataOutcome {
    pub song: MetadataCall,
    pub info: MetadataCall,
}

impl MetadataOutcome {
    /// Either call landing counts as success
    pub fn succeeded(&self) -> bool {
        self.song.status.is_success() || self.info.status.is_success()
    }
}

/// Client for the Icecast status and admin API
#[derive(Clone)]
pub struct IcecastClient {
    client: Client,
}

impl IcecastClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch and parse `/status-json.xsl`
    pub async fn fetch_json_status(&self, endpoint: &ServerEndpoint) -> Result<StatusPayload, StatusError> {
        let response = self.get(&endpoint.url("/status-json.xsl")).await?;
        let response = ensure_success(response)?;

        let body = response.text().await.map_err(StatusError::Transport)?;
        serde_json::from_str(&body).map_err(|e| StatusError::InvalidBody(e.to_string()))
    }

    /// Fetch `/status.xsl`; only used to see whether the server answers
    pub async fn fetch_xml_status(&self, endpoint: &ServerEndpoint) -> Result<(), StatusError> {
        let response = self.get(&endpoint.url("/status.xsl")).await?;
        ensure_success(response).map(|_| ())
    }

    /// Check that the server is up, preferring the JSON status page
    ///
    /// The JSON page only counts when it is served as `application/json`;
    /// older servers without it are confirmed through the XML page.
    pub async fn test_connection(&self, endpoint: &ServerEndpoint) -> Result<ConnectionProbe, StatusError> {
        let response = self.get(&endpoint.url("/status-json.xsl")).await?;
        if response.status().is_success() && is_json(&response) {
            return Ok(ConnectionProbe::JsonStatus);
        }

        log::debug!(
            "JSON status not available on {}:{} ({}), trying status.xsl",
            endpoint.host,
            endpoint.port,
            response.status()
        );
        self.fetch_xml_status(endpoint).await?;
        Ok(ConnectionProbe::XmlStatus)
    }

    /// Whether the server currently reports a source on `mount`
    pub async fn check_mount_active(&self, endpoint: &ServerEndpoint, mount: &str) -> Result<bool, StatusError> {
        let payload = self.fetch_json_status(endpoint).await?;
        Ok(is_mount_active(&payload, mount))
    }

    /// Push the song and the title/description/genre to the mount
    ///
    /// Two independent calls. Each one is retried once with the source
    /// credentials if the admin credentials are rejected with a 401.
    pub async fn update_metadata(
        &self,
        endpoint: &ServerEndpoint,
        update: &MetadataUpdate,
    ) -> Result<MetadataOutcome, StatusError> {
        let url = endpoint.url("/admin/metadata");

        let song = self.metadata_call(&url, &update.song_params(), update).await?;
        let info = self.metadata_call(&url, &update.info_params(), update).await?;

        let outcome = MetadataOutcome { song, info };
        log::info!(
            "Metadata update on {}: song={}, info={}",
            update.mount,
            song.status,
            info.status
        );
        Ok(outcome)
    }

    /// `GET /admin` without credentials; returns whatever status the server sends
    pub async fn probe_admin(&self, endpoint: &ServerEndpoint) -> Result<StatusCode, StatusError> {
        let response = self.get(&endpoint.url("/admin")).await?;
        Ok(response.status())
    }

    async fn metadata_call(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        update: &MetadataUpdate,
    ) -> Result<MetadataCall, StatusError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .basic_auth(&update.admin.user, Some(&update.admin.password))
            .send()
            .await
            .map_err(StatusError::Transport)?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(MetadataCall {
                status: response.status(),
                retried_as_source: false,
            });
        }

        log::warn!("Admin credentials rejected for {url}, retrying as '{SOURCE_USER}'");
        let response = self
            .client
            .get(url)
            .query(params)
            .basic_auth(SOURCE_USER, Some(&update.source_password))
            .send()
            .await
            .map_err(StatusError::Transport)?;

        Ok(MetadataCall {
            status: response.status(),
            retried_as_source: true,
        })
    }

    async fn get(&self, url: &str) -> Result<Response, StatusError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(StatusError::Transport)
    }
}

impl Default for IcecastClient {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_success(response: Response) -> Result<Response, StatusError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StatusError::Http { status })
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> MetadataUpdate {
        MetadataUpdate {
            mount: "/live".to_string(),
            title: String::new(),
            description: "Late night".to_string(),
            genre: String::new(),
            admin: Credentials {
                user: "admin".to_string(),
                password: "hackme".to_string(),
            },
            source_password: "src".to_string(),
        }
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = ServerEndpoint::new("radio.local", 8000);
        assert_eq!(endpoint.url("/admin"), "http://radio.local:8000/admin");
    }

    #[test]
    fn test_endpoint_from_settings_uses_fallbacks() {
        let mut settings = Settings::default();
        settings.host = "  ".to_string();
        settings.port = "abc".to_string();
        assert_eq!(ServerEndpoint::from_settings(&settings), ServerEndpoint::new("localhost", 8000));
    }

    #[test]
    fn test_song_defaults_to_untitled() {
        let params = update().song_params();
        assert!(params.contains(&("song", "Untitled".to_string())));
        assert!(params.contains(&("mode", "updinfo".to_string())));
    }

    #[test]
    fn test_info_params_skip_empty_fields() {
        let params = update().info_params();
        assert_eq!(
            params,
            vec![
                ("mount", "/live".to_string()),
                ("mode", "updmeta".to_string()),
                ("description", "Late night".to_string()),
            ]
        );
    }

    #[test]
    fn test_outcome_either_call_succeeds() {
        let ok = MetadataCall { status: StatusCode::OK, retried_as_source: false };
        let denied = MetadataCall { status: StatusCode::UNAUTHORIZED, retried_as_source: true };

        assert!(MetadataOutcome { song: ok, info: denied }.succeeded());
        assert!(MetadataOutcome { song: denied, info: ok }.succeeded());
        assert!(!MetadataOutcome { song: denied, info: denied }.succeeded());
    }
}

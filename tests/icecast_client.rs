mod common;

use axum::http::StatusCode as MockStatus;
use castdeck::services::{
    resolve, ConnectionProbe, Credentials, IcecastClient, MetadataUpdate, ServerEndpoint, StatusError,
};
use common::{closed_port, MockConfig, MockIcecast, ADMIN_AUTH, SOURCE_AUTH};
use serde_json::json;

fn endpoint(mock: &MockIcecast) -> ServerEndpoint {
    ServerEndpoint::new("127.0.0.1", mock.port())
}

fn update(admin_password: &str) -> MetadataUpdate {
    MetadataUpdate {
        mount: "/live".to_string(),
        title: "Night Shift".to_string(),
        description: String::new(),
        genre: "Ambient".to_string(),
        admin: Credentials {
            user: "admin".to_string(),
            password: admin_password.to_string(),
        },
        source_password: "srcpass".to_string(),
    }
}

#[tokio::test]
async fn test_status_is_resolved_for_matching_mount() {
    let mock = MockIcecast::start(MockConfig {
        status_json: Some(json!({
            "icestats": {
                "source": [
                    { "listenurl": "http://radio:8000/other", "listeners": 9 },
                    { "listenurl": "http://radio:8000/live", "listeners": 3,
                      "listener_peak": 12, "total_kbytes": 10 }
                ]
            }
        })),
        ..MockConfig::default()
    })
    .await;

    let payload = IcecastClient::new().fetch_json_status(&endpoint(&mock)).await.unwrap();
    let status = resolve(&payload, "/live", "127.0.0.1", mock.port());

    assert_eq!(status.listeners, 3);
    assert_eq!(status.peak, 12);
    assert_eq!(status.bytes, 10240);
    assert_eq!(status.url, "http://radio:8000/live");
}

#[tokio::test]
async fn test_missing_status_page_is_http_error() {
    let mock = MockIcecast::start(MockConfig::default()).await;

    let result = IcecastClient::new().fetch_json_status(&endpoint(&mock)).await;
    match result {
        Err(StatusError::Http { status }) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_body_is_invalid() {
    let mock = MockIcecast::start(MockConfig {
        status_json: Some(json!("not a status document")),
        ..MockConfig::default()
    })
    .await;

    let result = IcecastClient::new().fetch_json_status(&endpoint(&mock)).await;
    assert!(matches!(result, Err(StatusError::InvalidBody(_))));
}

#[tokio::test]
async fn test_closed_port_is_transport_error() {
    let endpoint = ServerEndpoint::new("127.0.0.1", closed_port());

    let err = IcecastClient::new().fetch_json_status(&endpoint).await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_connection_prefers_json_status() {
    let mock = MockIcecast::start(MockConfig {
        status_json: Some(json!({ "icestats": {} })),
        ..MockConfig::default()
    })
    .await;

    let probe = IcecastClient::new().test_connection(&endpoint(&mock)).await.unwrap();
    assert_eq!(probe, ConnectionProbe::JsonStatus);
}

#[tokio::test]
async fn test_connection_falls_back_when_not_served_as_json() {
    let mock = MockIcecast::start(MockConfig {
        status_json: Some(json!({ "icestats": {} })),
        json_content_type: "text/html",
        ..MockConfig::default()
    })
    .await;

    let probe = IcecastClient::new().test_connection(&endpoint(&mock)).await.unwrap();
    assert_eq!(probe, ConnectionProbe::XmlStatus);
}

#[tokio::test]
async fn test_connection_reports_xml_status_code() {
    let mock = MockIcecast::start(MockConfig {
        xml_status: MockStatus::SERVICE_UNAVAILABLE,
        ..MockConfig::default()
    })
    .await;

    let result = IcecastClient::new().test_connection(&endpoint(&mock)).await;
    match result {
        Err(StatusError::Http { status }) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_check_mount_on_single_source() {
    let mock = MockIcecast::start(MockConfig {
        status_json: Some(json!({
            "icestats": { "source": { "listenurl": "http://radio:8000/live" } }
        })),
        ..MockConfig::default()
    })
    .await;
    let client = IcecastClient::new();

    assert!(client.check_mount_active(&endpoint(&mock), "/live").await.unwrap());
    assert!(!client.check_mount_active(&endpoint(&mock), "/night").await.unwrap());
}

#[tokio::test]
async fn test_metadata_with_admin_credentials() {
    let mock = MockIcecast::start(MockConfig::default()).await;

    let outcome = IcecastClient::new()
        .update_metadata(&endpoint(&mock), &update("hackme"))
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert!(!outcome.song.retried_as_source);
    assert!(!outcome.info.retried_as_source);

    let requests = mock.metadata_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.authorization.as_deref() == Some(ADMIN_AUTH)));

    let song = &requests[0].params;
    assert_eq!(song.get("mode").map(String::as_str), Some("updinfo"));
    assert_eq!(song.get("song").map(String::as_str), Some("Night Shift"));
    assert_eq!(song.get("mount").map(String::as_str), Some("/live"));

    let info = &requests[1].params;
    assert_eq!(info.get("mode").map(String::as_str), Some("updmeta"));
    assert_eq!(info.get("title").map(String::as_str), Some("Night Shift"));
    assert_eq!(info.get("genre").map(String::as_str), Some("Ambient"));
    assert!(!info.contains_key("description"));
}

#[tokio::test]
async fn test_metadata_401_retries_once_as_source() {
    let mock = MockIcecast::start(MockConfig {
        accepted_auth: vec![SOURCE_AUTH],
        ..MockConfig::default()
    })
    .await;

    let outcome = IcecastClient::new()
        .update_metadata(&endpoint(&mock), &update("hackme"))
        .await
        .unwrap();

    assert!(outcome.succeeded());
    assert!(outcome.song.retried_as_source);
    assert!(outcome.info.retried_as_source);

    let auths: Vec<_> = mock
        .metadata_requests()
        .into_iter()
        .map(|r| r.authorization.unwrap_or_default())
        .collect();
    assert_eq!(auths, vec![ADMIN_AUTH, SOURCE_AUTH, ADMIN_AUTH, SOURCE_AUTH]);
}

#[tokio::test]
async fn test_metadata_rejected_everywhere_fails() {
    let mock = MockIcecast::start(MockConfig {
        accepted_auth: Vec::new(),
        ..MockConfig::default()
    })
    .await;

    let outcome = IcecastClient::new()
        .update_metadata(&endpoint(&mock), &update("wrong"))
        .await
        .unwrap();

    assert!(!outcome.succeeded());
    assert_eq!(outcome.song.status.as_u16(), 401);
    assert_eq!(outcome.info.status.as_u16(), 401);
    // One retry per call, never more
    assert_eq!(mock.metadata_requests().len(), 4);
}

#[tokio::test]
async fn test_probe_admin_returns_status() {
    let mock = MockIcecast::start(MockConfig {
        admin_status: MockStatus::OK,
        ..MockConfig::default()
    })
    .await;

    let status = IcecastClient::new().probe_admin(&endpoint(&mock)).await.unwrap();
    assert!(status.is_success());
}

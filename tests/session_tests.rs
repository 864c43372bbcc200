//! Session lifecycle against a mock agent server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{closed_port_url, test_config, APP, SESSION, USER};
use parley::error::{FailureKind, ParleyError};
use parley::session::{SessionKey, SessionManager, SessionOrigin};
use parley::transport::{Endpoints, HttpTransport};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PATH: &str = "/apps/search/users/u_123/sessions/s_123";

fn manager(base_url: &str) -> SessionManager {
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    SessionManager::new(Arc::new(transport), Endpoints::new(base_url).unwrap())
}

fn key() -> SessionKey {
    SessionKey::new(APP, USER, SESSION)
}

#[tokio::test]
async fn create_posts_initial_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .and(body_json(json!({"state": {"key1": "value1", "key2": 42}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": SESSION,
            "appName": APP,
            "userId": USER,
            "state": {"key1": "value1", "key2": 42},
            "events": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = manager(&server.uri())
        .ensure_session(&key(), &json!({"key1": "value1", "key2": 42}))
        .await
        .unwrap();

    assert_eq!(handle.origin, SessionOrigin::Created);
    assert_eq!(handle.key, key());
    assert_eq!(handle.state, Some(json!({"key1": "value1", "key2": 42})));
}

#[tokio::test]
async fn conflict_reuses_existing_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_string("Session already exists"))
        .expect(1)
        .mount(&server)
        .await;

    let handle = manager(&server.uri())
        .ensure_session(&key(), &json!({}))
        .await
        .unwrap();

    assert_eq!(handle.origin, SessionOrigin::Existing);
    assert_eq!(handle.state, None);
}

#[tokio::test]
async fn ensure_twice_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": {}})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = manager(&server.uri());
    let first = sessions.ensure_session(&key(), &json!({})).await.unwrap();
    let second = sessions.ensure_session(&key(), &json!({})).await.unwrap();

    assert_eq!(first.origin, SessionOrigin::Created);
    assert_eq!(second.origin, SessionOrigin::Existing);
    assert_eq!(first.key, second.key);
}

#[tokio::test]
async fn server_error_surfaces_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("agent module not found"))
        .mount(&server)
        .await;

    let err = manager(&server.uri())
        .ensure_session(&key(), &json!({}))
        .await
        .unwrap_err();

    match &err {
        ParleyError::Http { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "agent module not found");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert_eq!(
        err.user_message(),
        "Error communicating with agent: agent module not found"
    );
}

#[tokio::test]
async fn unreachable_server_is_connection_error() {
    let err = manager(&closed_port_url())
        .ensure_session(&key(), &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Connection);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn delete_accepts_success_and_missing() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let sessions = manager(&server.uri());
    sessions.delete_session(&key()).await.unwrap();
    sessions.delete_session(&key()).await.unwrap();
}

#[tokio::test]
async fn delete_failure_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(SESSION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = manager(&server.uri())
        .delete_session(&key())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn base_url_with_path_prefix_is_respected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/adk/apps/search/users/u_123/sessions/s_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&format!("{}/adk/", server.uri()));
    let handle = manager(&config.base_url)
        .ensure_session(&config.session_key(), &config.initial_state)
        .await
        .unwrap();
    assert_eq!(handle.origin, SessionOrigin::Created);
}

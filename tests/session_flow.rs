//! Session lifecycle against a mock auth server: login, restore,
//! refresh, rotation, forced logout.

mod common;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chirp::auth::{AuthError, SessionManager, TokenPair, TokenStore};

use common::{access_token, config_for, FAR_FUTURE};

fn store_in(dir: &tempfile::TempDir) -> TokenStore {
    TokenStore::new(dir.path().join("auth_tokens.json"))
}

fn seeded_store(dir: &tempfile::TempDir, access: &str, refresh: &str) -> TokenStore {
    let store = store_in(dir);
    store
        .save(&TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        })
        .unwrap();
    store
}

#[tokio::test]
async fn test_login_success_activates_session_and_persists_tokens() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token = access_token(5, "alice", FAR_FUTURE);

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .and(body_json(serde_json::json!({
            "username": "alice",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": token,
            "refresh": "refresh-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    let user = session.login("alice", "hunter2").await.unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.username, "alice");
    assert!(session.is_active());

    // Survives a restart via the store.
    let restored = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    assert_eq!(restored.current_user().unwrap().username, "alice");
}

#[tokio::test]
async fn test_login_failure_leaves_session_anonymous() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    let session = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    let err = session.login("alice", "wrong").await.unwrap_err();
    match err {
        AuthError::Rejected(message) => assert!(message.contains("No active account")),
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert!(!session.is_active());
    assert!(store_in(&dir).load().unwrap().is_none());
}

#[tokio::test]
async fn test_register_mismatch_never_issues_a_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Zero expected calls: a mismatch must be caught before the network.
    Mock::given(method("POST"))
        .and(path("/api/register/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    let err = session.register("bob", "pw1", "pw2").await.unwrap_err();
    assert!(matches!(err, AuthError::PasswordMismatch));
}

#[tokio::test]
async fn test_register_conflict_surfaces_server_message() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/register/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "Username is Taken"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    let err = session.register("bob", "pw", "pw").await.unwrap_err();
    match err {
        AuthError::Rejected(message) => assert_eq!(message, "Username is Taken"),
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_old_refresh_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let old_access = access_token(5, "alice", FAR_FUTURE);
    let new_access = access_token(5, "alice", FAR_FUTURE + 600);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(serde_json::json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": new_access,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &old_access, "refresh-1"),
    );
    session.refresh().await.unwrap();
    assert!(session.is_active());

    let stored = store_in(&dir).load().unwrap().unwrap();
    assert_eq!(stored.access, new_access);
    assert_eq!(stored.refresh, "refresh-1");
}

#[tokio::test]
async fn test_refresh_with_rotation_stores_new_refresh_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let old_access = access_token(5, "alice", FAR_FUTURE);
    let new_access = access_token(5, "alice", FAR_FUTURE + 600);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": new_access,
            "refresh": "refresh-2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &old_access, "refresh-1"),
    );
    session.refresh().await.unwrap();

    let stored = store_in(&dir).load().unwrap().unwrap();
    assert_eq!(stored.refresh, "refresh-2");
}

#[tokio::test]
async fn test_refresh_failure_forces_logout() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let access = access_token(5, "alice", FAR_FUTURE);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token is blacklisted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &access, "refresh-1"),
    );
    assert!(session.refresh().await.is_err());
    assert!(!session.is_active());
    assert!(store_in(&dir).load().unwrap().is_none());
}

#[tokio::test]
async fn test_expired_token_refreshes_opportunistically_before_requests() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let expired = access_token(5, "alice", 1_000_000);
    let fresh = access_token(5, "alice", FAR_FUTURE);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": fresh,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &expired, "refresh-1"),
    );
    assert_eq!(session.valid_access_token().await, Some(fresh));
}

#[tokio::test]
async fn test_expired_token_with_failing_refresh_yields_anonymous() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let expired = access_token(5, "alice", 1_000_000);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &expired, "refresh-1"),
    );
    assert!(session.valid_access_token().await.is_none());
    assert!(!session.is_active());
}

#[tokio::test]
async fn test_logout_notifies_server_with_refresh_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let access = access_token(5, "alice", FAR_FUTURE);

    Mock::given(method("POST"))
        .and(path("/api/logout/"))
        .and(body_json(serde_json::json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Logout Successful."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &access, "refresh-1"),
    );
    session.logout().await;
    assert!(!session.is_active());
    assert!(store_in(&dir).load().unwrap().is_none());
}

#[tokio::test]
async fn test_logout_completes_locally_when_server_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let access = access_token(5, "alice", FAR_FUTURE);

    // Nothing listens on this port; the notification can only fail.
    let config = common::config_for("http://127.0.0.1:1");
    let session = SessionManager::new(&config, seeded_store(&dir, &access, "refresh-1"));

    session.logout().await;
    assert!(!session.is_active());
    assert!(store_in(&dir).load().unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_timer_keeps_the_session_current() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let old_access = access_token(5, "alice", FAR_FUTURE);
    let new_access = access_token(5, "alice", FAR_FUTURE + 600);

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": new_access,
        })))
        .expect(1..)
        .mount(&server)
        .await;

    let session = std::sync::Arc::new(SessionManager::new(
        &config_for(&server.uri()),
        seeded_store(&dir, &old_access, "refresh-1"),
    ));
    let task = std::sync::Arc::clone(&session)
        .spawn_refresh_task(std::time::Duration::from_millis(50));

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    task.abort();

    assert_eq!(store_in(&dir).load().unwrap().unwrap().access, new_access);
    assert!(session.is_active());
}

#[tokio::test]
async fn test_logout_while_anonymous_is_a_no_op() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionManager::new(&config_for(&server.uri()), store_in(&dir));
    session.logout().await;
    assert!(!session.is_active());
}

//! Login and logout against a stand-in auth backend
#![cfg(not(target_arch = "wasm32"))]

use authgate_client_core::{
    storage::{ClientStorage as _, MemoryStorage},
    Client, SessionHandle, SessionStatus,
};
use authgate_shared::{const_config::storage::StorageKey, req_args::LoginReqArgs};
use futures::channel::oneshot;
use strum::IntoEnumIterator as _;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn login_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "access-alice",
        "refresh_token": "refresh-alice",
        "user_info": { "user_id": 7, "username": "alice", "nickname": "Alice" },
        "permissions": ["system:user:list"],
        "roles": ["editor"]
    })
}

fn login_args(password: &str) -> LoginReqArgs {
    LoginReqArgs::new("alice", password.to_string().into())
}

fn logged_out(storage: &MemoryStorage) -> SessionHandle {
    let result = SessionHandle::new(storage.clone());
    result.restore_session();
    result
}

#[tokio::test]
async fn accepted_login_authenticates_and_persists() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(
            serde_json::json!({ "username": "alice", "password": "right" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(1)
        .mount(&server)
        .await;
    let storage = MemoryStorage::new();
    let session = logged_out(&storage);
    let client = Client::new(server.uri(), session.clone());
    let (notify_tx, notify_rx) = oneshot::channel();

    // Act
    let outcome = client
        .login(login_args("right"), move || {
            let _ = notify_tx.send(());
        })
        .await
        .unwrap();
    notify_rx.await.unwrap();

    // Assert
    assert!(outcome.is_ok(), "login failed: {outcome:?}");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert!(session.check_permission("system:user:list"));
    assert!(session.check_role("editor"));
    for key in StorageKey::iter() {
        assert!(storage.get(key).unwrap().is_some(), "{key} was not stored");
    }
    assert_eq!(
        storage.get(StorageKey::AccessToken).unwrap().as_deref(),
        Some("access-alice")
    );
}

#[tokio::test]
async fn rejected_login_keeps_server_message() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": 401,
                "msg": "Invalid username or password"
            })),
        )
        .mount(&server)
        .await;
    let storage = MemoryStorage::new();
    let session = logged_out(&storage);
    let client = Client::new(server.uri(), session.clone());

    // Act
    let outcome = client.login(login_args("wrong"), || {}).await.unwrap();

    // Assert
    assert_eq!(
        outcome.unwrap_err().to_string(),
        "Invalid username or password"
    );
    let actual = session.session();
    assert_eq!(actual.status(), SessionStatus::LoginFailed);
    assert_eq!(actual.error.as_deref(), Some("Invalid username or password"));
    assert!(storage.is_empty());
}

#[tokio::test]
async fn logout_tells_backend_with_bearer() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer access-alice"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let storage = MemoryStorage::new();
    let session = logged_out(&storage);
    let client = Client::new(server.uri(), session.clone());
    client.login(login_args("right"), || {}).await.unwrap().unwrap();

    // Act
    let rx = client.logout();
    let cleared_before_answer = !session.is_authenticated();
    let outcome = rx.await.unwrap();

    // Assert
    assert!(cleared_before_answer);
    assert!(outcome.is_ok(), "logout failed: {outcome:?}");
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(storage.is_empty());
}

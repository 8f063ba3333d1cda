//! Integration tests for the session lifecycle: credential exchange,
//! persistence across restarts, and logout erasing the chat history.
//!
//! Each test creates its own in-memory SQLite database for isolation.

use guardian::auth::{AuthError, SessionStore};
use guardian::chat::{ChatHistory, Role, GREETING};
use guardian::storage::Database;
use secrecy::ExposeSecret;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_exchanges_credentials_and_persists_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(serde_json::json!({
            "email": "analyst@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "issued-token",
            "email": "analyst@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = test_db().await;
    let mut store = SessionStore::load(db.clone()).await.unwrap();
    let auth_base = Url::parse(&server.uri()).unwrap();
    store
        .login(&auth_base, "analyst@example.com", "hunter2")
        .await
        .unwrap();

    // A fresh store sees the persisted session, as after a restart.
    let reloaded = SessionStore::load(db).await.unwrap();
    let session = reloaded.current().unwrap();
    assert_eq!(session.email, "analyst@example.com");
    assert_eq!(
        reloaded.current_token().unwrap().expose_secret(),
        "issued-token"
    );
}

#[tokio::test]
async fn rejected_credentials_surface_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let mut store = SessionStore::load(test_db().await).await.unwrap();
    let auth_base = Url::parse(&server.uri()).unwrap();
    let err = store
        .login(&auth_base, "analyst@example.com", "wrong")
        .await
        .unwrap_err();
    match err {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad credentials");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
    // Nothing was persisted.
    assert!(store.current().is_none());
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn logout_erases_session_and_transcript() {
    let db = test_db().await;
    db.save_session("analyst@example.com", "tok").await.unwrap();

    // Build up a conversation first.
    {
        let mut chat = ChatHistory::load(db.clone()).await.unwrap();
        chat.push(Role::User, "situation in Rafah?".into())
            .await
            .unwrap();
        chat.push(Role::Api, "Here is the latest.".into())
            .await
            .unwrap();
    }

    let mut store = SessionStore::load(db.clone()).await.unwrap();
    store.logout().await.unwrap();

    assert!(db.load_session().await.unwrap().is_none());
    // The transcript is gone; a fresh history starts from the greeting
    // alone.
    let chat = ChatHistory::load(db).await.unwrap();
    assert_eq!(chat.messages().len(), 1);
    assert_eq!(chat.messages()[0].text, GREETING);
}

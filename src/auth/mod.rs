//! Session store and identity-provider exchange.
//!
//! The session is an explicitly owned object: the store hands the bearer
//! token to whoever constructs the API client, and nothing else in the
//! process can reach it. Ordinary requests never touch the network from
//! here — only the one-time credential exchange does.

use crate::storage::Database;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No valid session exists; the caller must go through login first.
    #[error("Not authenticated — run with --login first")]
    NotAuthenticated,
    /// The identity provider rejected the credentials.
    #[error("Authentication rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
    /// Network-level failure during the credential exchange.
    #[error("Authentication exchange failed: {0}")]
    Exchange(#[from] reqwest::Error),
    /// Session persistence failed.
    #[error("Session storage error: {0}")]
    Storage(String),
    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// An authenticated identity. The token never appears in Debug output.
#[derive(Clone)]
pub struct Session {
    pub email: String,
    pub token: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Response shape of the identity provider's `POST /login`.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    email: Option<String>,
}

/// Owns the current authenticated identity and its persistence.
pub struct SessionStore {
    db: Database,
    current: Option<Session>,
}

impl SessionStore {
    /// Restore the store from persistence. A missing stored session is
    /// not an error; `current_token` reports it when the session is
    /// actually needed.
    pub async fn load(db: Database) -> Result<Self, AuthError> {
        let current = db
            .load_session()
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .map(|stored| Session {
                email: stored.email,
                token: SecretString::from(stored.token),
            });
        Ok(Self { db, current })
    }

    /// Exchange credentials with the identity provider and record the
    /// resulting identity.
    pub async fn login(
        &mut self,
        auth_base: &Url,
        email: &str,
        password: &str,
    ) -> Result<&Session, AuthError> {
        let session = exchange_credentials(auth_base, email, password).await?;
        self.db
            .save_session(&session.email, session.token.expose_secret())
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        tracing::info!(email = %session.email, "Logged in");
        self.current = Some(session);
        Ok(self.current.as_ref().expect("session just stored"))
    }

    /// Clear the identity and the locally cached conversation history.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        self.db
            .clear_session()
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let removed = self
            .db
            .clear_messages()
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        tracing::info!(chat_messages_removed = removed, "Logged out");
        self.current = None;
        Ok(())
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The bearer token for outbound requests.
    ///
    /// Fails with [`AuthError::NotAuthenticated`] when no valid session
    /// exists — the protected-route boundary.
    pub fn current_token(&self) -> Result<SecretString, AuthError> {
        self.current
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(AuthError::NotAuthenticated)
    }
}

/// Perform the external authentication exchange.
///
/// This is the only network call the auth layer makes; it uses a
/// throwaway HTTP client since no bearer credential exists yet.
async fn exchange_credentials(
    auth_base: &Url,
    email: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let url = auth_base.join("login")?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = http
        .post(url)
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let body: LoginResponse = response.json().await?;
    Ok(Session {
        email: body.email.unwrap_or_else(|| email.to_string()),
        token: SecretString::from(body.token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SessionStore {
        let db = Database::open(":memory:").await.unwrap();
        SessionStore::load(db).await.unwrap()
    }

    #[tokio::test]
    async fn token_requires_session() {
        let store = test_store().await;
        assert!(matches!(
            store.current_token(),
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn stored_session_survives_reload() {
        let db = Database::open(":memory:").await.unwrap();
        db.save_session("analyst@example.com", "tok-77").await.unwrap();

        let store = SessionStore::load(db).await.unwrap();
        let session = store.current().unwrap();
        assert_eq!(session.email, "analyst@example.com");
        assert_eq!(store.current_token().unwrap().expose_secret(), "tok-77");
    }

    #[tokio::test]
    async fn logout_clears_session_and_chat_history() {
        let db = Database::open(":memory:").await.unwrap();
        db.save_session("a@example.com", "tok").await.unwrap();
        db.append_message("user", "hello").await.unwrap();

        let mut store = SessionStore::load(db.clone()).await.unwrap();
        store.logout().await.unwrap();

        assert!(store.current().is_none());
        assert!(db.load_session().await.unwrap().is_none());
        assert!(db.load_messages().await.unwrap().is_empty());
    }

    #[test]
    fn session_debug_masks_token() {
        let session = Session {
            email: "a@example.com".into(),
            token: SecretString::from("super-secret"),
        };
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}

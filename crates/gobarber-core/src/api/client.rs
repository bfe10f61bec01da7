//! API client for communicating with the GoBarber REST API.
//!
//! This module provides the `ApiClient` struct for creating sessions and
//! making authenticated profile requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::SessionState;
use crate::models::{Credentials, ProfileUpdate, SessionResponse, User};

use super::{ApiError, SessionApi};

// ============================================================================
// Constants
// ============================================================================

/// Backend URL used when no configuration overrides it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Relative path for session creation.
const SESSIONS_PATH: &str = "sessions";

/// Relative path for the signed-in user's profile.
const PROFILE_PATH: &str = "profile";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the GoBarber backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<watch::Receiver<SessionState>>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client that sends no authorization header.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Create a client bound to a session, sharing the connection pool.
    ///
    /// Every request reads the session's token when it is built, so signing
    /// in or out changes the header of the next request without touching
    /// the client.
    pub fn with_session(&self, session: watch::Receiver<SessionState>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            session: Some(session),
            initial_backoff: self.initial_backoff,
        }
    }

    /// Override the first rate-limit backoff delay. It doubles on each retry.
    pub fn with_retry_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` value the next request would carry, if any.
    pub fn authorization(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let state = session.borrow();
        state.token().map(|token| format!("Bearer {}", token))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(value) = self.authorization() {
            headers.insert(header::AUTHORIZATION, header::HeaderValue::from_str(&value)?);
        }
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a JSON request, retrying with exponential backoff while the
    /// server answers 429.
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let text = response.text().await?;
                debug!(%method, url = %url, status = status.as_u16(), "Request succeeded");
                return serde_json::from_str(&text).map_err(|e| {
                    ApiError::InvalidResponse(format!("{} {}: {}", method, path, e))
                });
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
    }

    /// Exchange credentials for a token and the account profile.
    pub async fn create_session(&self, credentials: &Credentials) -> Result<SessionResponse, ApiError> {
        self.send(Method::POST, SESSIONS_PATH, credentials).await
    }

    /// Update the signed-in user's profile and return the stored result.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.send(Method::PUT, PROFILE_PATH, update).await
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn create_session(&self, credentials: &Credentials) -> Result<SessionResponse, ApiError> {
        ApiClient::create_session(self, credentials).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionData;
    use mockito::Matcher;
    use serde_json::json;

    fn signed_in(token: &str) -> SessionState {
        SessionState::signed_in(SessionData {
            token: token.to_string(),
            user: User {
                id: "1".into(),
                name: "A".into(),
                email: "a@b.com".into(),
                avatar_url: String::new(),
            },
        })
    }

    #[test]
    fn test_url_joins_paths() {
        let client = ApiClient::new("http://api.test/").unwrap();
        assert_eq!(client.base_url(), "http://api.test");
        assert_eq!(client.url("sessions"), "http://api.test/sessions");
        assert_eq!(client.url("/profile"), "http://api.test/profile");
    }

    #[test]
    fn test_authorization_follows_session_state() {
        let (tx, rx) = watch::channel(SessionState::default());
        let base = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(base.authorization(), None);

        let bound = base.with_session(rx);
        assert_eq!(bound.authorization(), None);

        tx.send_replace(signed_in("abc"));
        assert_eq!(bound.authorization().as_deref(), Some("Bearer abc"));

        tx.send_replace(SessionState::signed_out());
        assert_eq!(bound.authorization(), None);
    }

    #[tokio::test]
    async fn test_create_session_posts_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sessions")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "x"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"abc","user":{"id":"1","name":"A","email":"a@b.com","avatar_url":""}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let response = client
            .create_session(&Credentials::new("a@b.com", "x"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.token, "abc");
        assert_eq!(response.user.id, "1");
    }

    #[tokio::test]
    async fn test_create_session_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/sessions")
            .with_status(200)
            .with_body(r#"{"user":{"id":"1"}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client
            .create_session(&Credentials::new("a@b.com", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_create_session_maps_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/sessions")
            .with_status(401)
            .with_body(r#"{"status":"error","message":"Incorrect email/password combination."}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url()).unwrap();
        let err = client
            .create_session(&Credentials::new("a@b.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_update_profile_sends_current_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/profile")
            .match_header("authorization", "Bearer abc")
            .match_body(Matcher::Json(json!({"name": "B", "email": "b@b.com"})))
            .with_status(200)
            .with_body(r#"{"id":"1","name":"B","email":"b@b.com","avatar_url":"http://x/a.png"}"#)
            .create_async()
            .await;

        let (_tx, rx) = watch::channel(signed_in("abc"));
        let client = ApiClient::new(server.url()).unwrap().with_session(rx);
        let user = client
            .update_profile(&ProfileUpdate::new("B", "b@b.com"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(user.name, "B");
        assert_eq!(user.avatar_url, "http://x/a.png");
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/sessions")
            .with_status(429)
            .expect(MAX_RATE_LIMIT_RETRIES as usize + 1)
            .create_async()
            .await;

        let client = ApiClient::new(server.url())
            .unwrap()
            .with_retry_backoff(Duration::from_millis(1));
        let err = client
            .create_session(&Credentials::new("a@b.com", "x"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ApiError::RateLimited));
    }
}

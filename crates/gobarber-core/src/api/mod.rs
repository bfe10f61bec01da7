//! REST API client module for the GoBarber backend.
//!
//! This module provides the `ApiClient` for creating sessions and editing
//! the signed-in profile, and the `SessionApi` trait the session manager
//! depends on.
//!
//! Requests are authenticated with a JWT bearer token taken from the
//! current session state at the moment each request is built.

pub mod client;
pub mod error;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{Credentials, SessionResponse};

/// Backend operation used by sign-in.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Exchange credentials for a token and the account profile.
    async fn create_session(&self, credentials: &Credentials) -> Result<SessionResponse, ApiError>;
}

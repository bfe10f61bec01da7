//! Core library for the GoBarber client.
//!
//! Keeps the signed-in session (token and user profile) in memory, mirrors
//! it to durable storage, and attaches the token to outgoing API requests.
//! UI layers observe the session through `SessionManager::subscribe` or
//! reach the manager with `use_session` inside a `SessionProvider` scope.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, SessionApi};
pub use auth::{use_session, SessionError, SessionManager, SessionProvider, SessionState};
pub use config::{Config, StoreBackend};
pub use models::{Credentials, ProfileUpdate, SessionData, User};
pub use storage::{PersistentStore, StorageError};

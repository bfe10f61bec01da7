//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionManager`: restores, creates, updates and clears the session,
//!   keeping storage and published state in step
//! - `SessionState`: the snapshot consumers observe through a watch channel
//! - `SessionProvider` / `use_session`: scoped access to a manager
//!
//! The session is persisted under two storage keys: the raw token and the
//! JSON-encoded user.

pub mod error;
pub mod provider;
pub mod session;
pub mod state;

pub use error::SessionError;
pub use provider::{use_session, SessionProvider};
pub use session::SessionManager;
pub use state::SessionState;

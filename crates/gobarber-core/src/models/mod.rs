//! Data models for GoBarber accounts.
//!
//! - `User`, `ProfileUpdate`: the account profile and its edit form
//! - `Credentials`, `SessionData`, `SessionResponse`: sign-in input and output

pub mod session;
pub mod user;

pub use session::{Credentials, SessionData, SessionResponse};
pub use user::{ProfileUpdate, User};

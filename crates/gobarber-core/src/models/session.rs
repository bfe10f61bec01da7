use std::fmt;

use serde::{Deserialize, Serialize};

use super::User;

/// Email/password pair typed into the sign-in form. Consumed once by sign-in.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session: the bearer token and the profile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionData {
    pub token: String,
    pub user: User,
}

/// Response body of `POST sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

impl From<SessionResponse> for SessionData {
    fn from(response: SessionResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_body() {
        let body = serde_json::to_value(Credentials::new("a@b.com", "x")).expect("serialize");
        assert_eq!(body, serde_json::json!({"email": "a@b.com", "password": "x"}));
    }

    #[test]
    fn test_session_response_requires_token() {
        let json = r#"{"user":{"id":"1","name":"A","email":"a@b.com","avatar_url":""}}"#;
        assert!(serde_json::from_str::<SessionResponse>(json).is_err());

        let json = r#"{"token":"abc","user":{"id":"1","name":"A","email":"a@b.com","avatar_url":""}}"#;
        let data: SessionData = serde_json::from_str::<SessionResponse>(json)
            .expect("valid session response")
            .into();
        assert_eq!(data.token, "abc");
        assert_eq!(data.user.id, "1");
    }
}

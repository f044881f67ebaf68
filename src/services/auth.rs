//! Account sign-up and sign-in against the hosted auth provider.
//!
//! Password handling, sessions and email confirmation all happen on the
//! provider side (GoTrue-compatible `/auth/v1` API).

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication is not configured")]
    NotConfigured,

    #[error("auth request failed: {0}")]
    Request(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("malformed auth response: {0}")]
    Malformed(String),
}

pub trait AuthProvider: Send + Sync {
    fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, AuthError>;

    fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;
}

/// Used when no auth provider is configured; every call fails
pub struct DisabledAuth;

impl AuthProvider for DisabledAuth {
    fn sign_up(&self, _credentials: &Credentials) -> Result<AuthUser, AuthError> {
        Err(AuthError::NotConfigured)
    }

    fn sign_in(&self, _credentials: &Credentials) -> Result<AuthSession, AuthError> {
        Err(AuthError::NotConfigured)
    }
}

/// Sign-up returns the bare user when email confirmation is pending,
/// or `{user, session}` when the account is usable immediately.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    WithSession { user: AuthUser },
    Bare(AuthUser),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

pub struct GoTrueAuth {
    base_url: String,
    api_key: String,
}

impl GoTrueAuth {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn post(&self, path: &str, credentials: &Credentials) -> Result<reqwest::blocking::Response, AuthError> {
        let response = Client::new()
            .post(format!("{}/auth/v1{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .json(credentials)
            .send()
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        Err(AuthError::Rejected { status, message })
    }
}

impl AuthProvider for GoTrueAuth {
    fn sign_up(&self, credentials: &Credentials) -> Result<AuthUser, AuthError> {
        let response: SignUpResponse = self
            .post("/signup", credentials)?
            .json()
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(match response {
            SignUpResponse::WithSession { user } => user,
            SignUpResponse::Bare(user) => user,
        })
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let response: TokenResponse = self
            .post("/token?grant_type=password", credentials)?
            .json()
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(AuthSession {
            user: response.user,
            access_token: response.access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_response_shapes() {
        let bare: SignUpResponse =
            serde_json::from_str(r#"{"id": "u-1", "email": "a@b.c", "role": "authenticated"}"#).unwrap();
        assert!(matches!(bare, SignUpResponse::Bare(ref u) if u.id == "u-1"));

        let nested: SignUpResponse = serde_json::from_str(
            r#"{"user": {"id": "u-2", "email": "a@b.c"}, "session": {"access_token": "t"}}"#,
        )
        .unwrap();
        assert!(matches!(nested, SignUpResponse::WithSession { ref user } if user.id == "u-2"));
    }

    #[test]
    fn test_error_message_aliases() {
        let e: ErrorResponse =
            serde_json::from_str(r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(e.message.as_deref(), Some("Invalid login credentials"));

        let e: ErrorResponse = serde_json::from_str(r#"{"code": 422, "msg": "User already registered"}"#).unwrap();
        assert_eq!(e.message.as_deref(), Some("User already registered"));
    }

    #[test]
    fn test_disabled_auth() {
        let creds = Credentials { email: "a@b.c".into(), password: "pw".into() };
        assert!(matches!(DisabledAuth.sign_in(&creds), Err(AuthError::NotConfigured)));
    }
}

//! Credentials and the authentication collaborator.
//!
//! The bearer credential is passed explicitly to every backend call; nothing
//! in this crate stores it globally.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Bearer credential obtained at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    /// Wraps an existing bearer token.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// The signed-in user as reported by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    /// Encrypted server-side; only its presence matters to the client.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

fn default_role() -> String {
    "user".to_string()
}

impl UserProfile {
    /// The backend refuses fill requests until a Gemini key is stored.
    pub fn has_gemini_key(&self) -> bool {
        self.gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(full_name) if !full_name.is_empty() => {
                format!("{} ({})", full_name, self.username)
            }
            _ => self.username.clone(),
        }
    }
}

/// Authentication collaborator: obtains credentials and manages the user profile.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges username and password for a bearer credential.
    async fn login(&self, username: &str, password: &str) -> Result<Credential>;

    /// Fetches the profile of the user owning `credential`.
    async fn current_user(&self, credential: &Credential) -> Result<UserProfile>;

    /// Stores the user's Gemini API key on the backend.
    async fn update_gemini_key(&self, credential: &Credential, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::bearer("super-secret");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("super-secret"));
        assert_eq!(credential.authorization_header(), "Bearer super-secret");
    }

    #[test]
    fn test_credential_from_token_response() {
        let credential: Credential =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer"}"#).unwrap();
        assert_eq!(credential.access_token(), "abc");
        assert_eq!(credential.token_type(), "bearer");
    }

    #[test]
    fn test_profile_defaults_and_helpers() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"username":"lan","full_name":"Nguyễn Lan"}"#).unwrap();
        assert_eq!(profile.role, "user");
        assert!(!profile.is_admin());
        assert!(!profile.has_gemini_key());
        assert_eq!(profile.display_name(), "Nguyễn Lan (lan)");

        let admin: UserProfile = serde_json::from_str(
            r#"{"username":"root","role":"admin","gemini_api_key":"gAAAA"}"#,
        )
        .unwrap();
        assert!(admin.is_admin());
        assert!(admin.has_gemini_key());
        assert_eq!(admin.display_name(), "root");
    }
}

//! `AuthService` over the backend's OAuth2 password flow.

use async_trait::async_trait;
use lexa_core::error::{LexaError, Result};
use lexa_core::{AuthService, ClientConfig, Credential, UserProfile};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;

use super::{build_http_client, check_status, decode_json, transport_error};

#[derive(Serialize)]
struct GeminiKeyRequest<'a> {
    key: &'a str,
}

/// Logs in and manages the user profile over HTTP.
#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    config: ClientConfig,
}

impl HttpAuthClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AuthService for HttpAuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let url = self.config.endpoint("token");
        tracing::debug!("[Auth] POST {} as {}", url, username);

        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| transport_error("Login failed", e))?;

        let response = check_status(response).await?;
        let credential: Credential = decode_json("Failed to parse token", response).await?;
        if credential.access_token().is_empty() {
            return Err(LexaError::Unauthorized(
                "backend returned an empty access token".to_string(),
            ));
        }

        tracing::info!("[Auth] Logged in as {}", username);
        Ok(credential)
    }

    async fn current_user(&self, credential: &Credential) -> Result<UserProfile> {
        let url = self.config.endpoint("users/me");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .send()
            .await
            .map_err(|e| transport_error("Failed to fetch profile", e))?;

        let response = check_status(response).await?;
        decode_json("Failed to parse profile", response).await
    }

    async fn update_gemini_key(&self, credential: &Credential, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LexaError::config("Gemini API key must not be empty"));
        }

        let url = self.config.endpoint("users/me/gemini");
        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .json(&GeminiKeyRequest { key })
            .send()
            .await
            .map_err(|e| transport_error("Failed to update Gemini key", e))?;

        check_status(response).await?;
        tracing::info!("[Auth] Gemini API key updated");
        Ok(())
    }
}

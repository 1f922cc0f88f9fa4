//! HTTP adapters for the contract backend.
//!
//! Shared plumbing lives here: client construction and the mapping from
//! HTTP failures to `LexaError`.

mod auth_client;
mod contract_backend;

pub use auth_client::HttpAuthClient;
pub use contract_backend::HttpContractBackend;

use lexa_core::error::{LexaError, Result};
use lexa_core::ClientConfig;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Builds the reqwest client shared by all adapters.
pub fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| LexaError::transport(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn transport_error(context: &str, error: reqwest::Error) -> LexaError {
    if error.is_timeout() {
        LexaError::transport(format!("{}: request timed out", context))
    } else {
        LexaError::transport(format!("{}: {}", context, error))
    }
}

/// Passes successful responses through and turns the rest into errors.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body);
    tracing::debug!("[Http] {} from backend: {:?}", status, detail);

    if status == StatusCode::UNAUTHORIZED {
        return Err(LexaError::Unauthorized(
            detail.unwrap_or_else(|| "Could not validate credentials".to_string()),
        ));
    }
    Err(LexaError::backend(status.as_u16(), detail))
}

/// Pulls a human-readable detail out of an error body.
///
/// The backend answers `{"detail": "..."}`; validation errors carry a
/// structured `detail`, which is returned as JSON text. Bodies that are not
/// JSON (proxy error pages, plain text) carry no detail.
pub fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => Some(detail.clone()),
            Some(Value::Null) | Some(Value::String(_)) | None => None,
            Some(other) => Some(other.to_string()),
        },
        Ok(_) | Err(_) => None,
    }
}

pub(crate) async fn decode_json<T>(context: &str, response: Response) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(context, e))?;
    serde_json::from_slice(&body)
        .map_err(|e| LexaError::serialization("json", format!("{}: {}", context, e)))
}

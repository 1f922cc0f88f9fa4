//! Backend seam for the drafting protocol.
//!
//! The backend is stateless per request: every fill request carries the whole
//! session state, and the client is the only source of truth between calls.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::auth::Credential;
use crate::error::Result;
use crate::template::{Template, TemplateResolution};
use crate::transcript::Turn;
use crate::variables::VariablesWire;

/// Request body for `POST /download-template`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveRequest<'a> {
    pub filename: &'a str,
}

/// Request body for one fill-protocol exchange (`POST /chat-contract`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    /// The newly submitted user message.
    pub message: String,
    /// Current variable state, see [`crate::VariableState::to_wire`].
    pub variables: Value,
    /// Transcript before `message` was appended.
    pub messages: Vec<Turn>,
    /// Template body fetched at bootstrap.
    pub content_template: String,
}

/// Response body of one fill-protocol exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FillReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub variables: VariablesWire,
}

impl FillReply {
    /// Link as stored on the transcript turn (empty when absent).
    pub fn link(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }
}

/// A rendered contract fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested filename: the link the backend emitted.
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Remote operations used by a drafting session.
#[async_trait::async_trait]
pub trait ContractBackend: Send + Sync {
    /// Lists the available contract templates.
    async fn list_templates(&self, credential: &Credential) -> Result<Vec<Template>>;

    /// Resolves a template filename into its variable slots and body.
    async fn resolve_template(
        &self,
        credential: &Credential,
        filename: &str,
    ) -> Result<TemplateResolution>;

    /// Runs one fill-protocol exchange.
    async fn fill_turn(&self, credential: &Credential, request: &FillRequest) -> Result<FillReply>;

    /// Fetches the rendered document behind an artifact link.
    async fn download_artifact(&self, credential: &Credential, link: &str) -> Result<Artifact>;
}

/// Local destination for downloaded artifacts.
#[async_trait::async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Saves the artifact under its suggested filename and returns where it went.
    async fn save(&self, artifact: &Artifact) -> Result<PathBuf>;
}

//! `ContractBackend` over the drafting REST API.

use async_trait::async_trait;
use lexa_core::backend::ResolveRequest;
use lexa_core::error::{LexaError, Result};
use lexa_core::{
    Artifact, ClientConfig, ContractBackend, Credential, FillReply, FillRequest, Template,
    TemplateResolution,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use super::{build_http_client, check_status, decode_json, transport_error};

/// Talks to the drafting backend over HTTP.
///
/// Stateless: the credential comes with every call.
#[derive(Clone)]
pub struct HttpContractBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpContractBackend {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Reuses an existing client (shared connection pool).
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

/// Local filename for an artifact link: its last path segment.
fn artifact_filename(link: &str) -> String {
    link.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ContractBackend for HttpContractBackend {
    async fn list_templates(&self, credential: &Credential) -> Result<Vec<Template>> {
        let url = self.config.endpoint("contract");
        tracing::debug!("[HttpBackend] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .send()
            .await
            .map_err(|e| transport_error("Failed to list templates", e))?;

        let response = check_status(response).await?;
        let templates: Vec<Template> = decode_json("Failed to parse template list", response).await?;
        tracing::info!("[HttpBackend] Listed {} templates", templates.len());
        Ok(templates)
    }

    async fn resolve_template(
        &self,
        credential: &Credential,
        filename: &str,
    ) -> Result<TemplateResolution> {
        let url = self.config.endpoint("download-template");
        tracing::debug!("[HttpBackend] POST {} ({})", url, filename);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .json(&ResolveRequest { filename })
            .send()
            .await
            .map_err(|e| transport_error("Failed to resolve template", e))?;

        let response = check_status(response).await?;
        decode_json("Failed to parse template resolution", response).await
    }

    async fn fill_turn(&self, credential: &Credential, request: &FillRequest) -> Result<FillReply> {
        let url = self.config.endpoint("chat-contract");
        tracing::debug!(
            "[HttpBackend] POST {} ({} prior turns)",
            url,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("Fill exchange failed", e))?;

        let response = check_status(response).await?;
        decode_json("Failed to parse fill reply", response).await
    }

    async fn download_artifact(&self, credential: &Credential, link: &str) -> Result<Artifact> {
        let filename = artifact_filename(link);
        if filename.is_empty() {
            return Err(LexaError::internal(format!("Invalid artifact link: '{}'", link)));
        }

        let url = self
            .config
            .endpoint(&format!("download/{}", link.trim().trim_start_matches('/')));
        tracing::debug!("[HttpBackend] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, credential.authorization_header())
            .send()
            .await
            .map_err(|e| transport_error("Failed to download artifact", e))?;

        let response = check_status(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("Failed to read artifact body", e))?;

        tracing::info!("[HttpBackend] Downloaded {} ({} bytes)", filename, bytes.len());
        Ok(Artifact {
            filename,
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_filename() {
        assert_eq!(artifact_filename("contract_42.docx"), "contract_42.docx");
        assert_eq!(artifact_filename("output/contract_42.docx"), "contract_42.docx");
        assert_eq!(artifact_filename("  "), "");
    }
}

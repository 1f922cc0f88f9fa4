use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use lexa_core::{AuthService, ClientConfig, Credential, DraftingService};
use lexa_infrastructure::{
    build_http_client, ConfigStorage, FsArtifactStore, HttpAuthClient, HttpContractBackend,
};

use crate::prompt;
use crate::GlobalArgs;

const ENV_PASSWORD: &str = "LEXA_PASSWORD";

/// Configuration plus the HTTP adapters, shared by all subcommands.
pub struct AppContext {
    pub config: ClientConfig,
    pub backend: Arc<HttpContractBackend>,
    pub auth: HttpAuthClient,
}

impl AppContext {
    /// Loads the configuration and builds the adapters around one HTTP client.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let storage = match &args.config {
            Some(path) => ConfigStorage::with_path(path.clone()),
            None => ConfigStorage::new()?,
        };
        let mut config = storage
            .load()
            .with_context(|| format!("Failed to load {}", storage.path().display()))?;
        if let Some(base_url) = &args.base_url {
            config.base_url = base_url.clone();
        }

        tracing::debug!("[Cli] Using backend at {}", config.base_url);

        let client = build_http_client(&config)?;
        let backend = Arc::new(HttpContractBackend::with_client(
            client.clone(),
            config.clone(),
        ));
        let auth = HttpAuthClient::with_client(client, config.clone());

        Ok(Self {
            config,
            backend,
            auth,
        })
    }

    /// Resolves the credential: explicit token first, then username/password login.
    pub async fn credential(&self, args: &GlobalArgs) -> Result<Credential> {
        if let Some(token) = args.token.as_deref().map(str::trim)
            && !token.is_empty()
        {
            return Ok(Credential::bearer(token));
        }

        let Some(username) = args.username.as_deref() else {
            bail!("Not logged in. Pass --token (or set LEXA_TOKEN), or log in with --username.");
        };
        self.login(username).await
    }

    /// Logs in as `username`, taking the password from the environment or a prompt.
    pub async fn login(&self, username: &str) -> Result<Credential> {
        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) if !password.is_empty() => password,
            _ => prompt::read_password(&format!("Password for {}: ", username))?,
        };

        let credential = self.auth.login(username, &password).await?;
        Ok(credential)
    }

    /// Builds a drafting service saving into `download_dir`, or the configured directory.
    pub fn drafting_service(
        &self,
        credential: Credential,
        download_dir: Option<PathBuf>,
    ) -> DraftingService {
        let dir = download_dir.unwrap_or_else(|| self.config.download_dir.clone());
        DraftingService::new(
            self.backend.clone(),
            Arc::new(FsArtifactStore::new(dir)),
            credential,
        )
    }
}

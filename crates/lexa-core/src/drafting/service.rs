use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::state::{DraftPhase, DraftingSession};
use crate::auth::Credential;
use crate::backend::{ArtifactSink, ContractBackend};
use crate::error::{LexaError, Result};
use crate::template::Template;
use crate::transcript::{Transcript, Turn};
use crate::variables::VariableState;

/// Result of one fill-protocol exchange that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The backend answered; the turn holds its response and link.
    Replied(Turn),
    /// The request failed; the turn reports the error.
    Failed { turn: Turn, error: LexaError },
}

impl ExchangeOutcome {
    pub fn turn(&self) -> &Turn {
        match self {
            Self::Replied(turn) => turn,
            Self::Failed { turn, .. } => turn,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum PendingCall {
    Bootstrap,
    Exchange,
}

/// Settles a pending bootstrap or exchange whose future was dropped before
/// the backend answered, so the session does not stay busy forever.
///
/// The pending call is completed as a `Cancelled` failure: an error turn is
/// appended and the session returns to `Filling`.
struct PendingGuard {
    session: Arc<RwLock<DraftingSession>>,
    call: PendingCall,
    armed: bool,
}

impl PendingGuard {
    fn new(session: &Arc<RwLock<DraftingSession>>, call: PendingCall) -> Self {
        Self {
            session: Arc::clone(session),
            call,
            armed: true,
        }
    }

    /// Call once the outcome is about to be applied under the write lock.
    fn disarm(mut self) {
        self.armed = false;
    }

    fn settle(session: &mut DraftingSession, call: PendingCall) {
        let result = match call {
            PendingCall::Bootstrap => session.apply_bootstrap(Err(LexaError::Cancelled)).map(drop),
            PendingCall::Exchange => session.apply_fill(Err(LexaError::Cancelled)).map(drop),
        };
        match result {
            Ok(()) => tracing::warn!("[Drafting] {:?} cancelled before the backend answered", call),
            Err(e) => tracing::debug!("[Drafting] Nothing to settle after cancel: {}", e),
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let call = self.call;

        if let Ok(mut session) = self.session.try_write() {
            Self::settle(&mut session, call);
            return;
        }

        // The lock is only ever held briefly; finish on the runtime.
        let session = Arc::clone(&self.session);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut session = session.write().await;
                    Self::settle(&mut session, call);
                });
            }
            Err(_) => tracing::warn!(
                "[Drafting] {:?} cancelled outside a runtime; session left busy",
                call
            ),
        }
    }
}

/// Drives one drafting session against a backend.
///
/// `DraftingService` is responsible for:
/// - Loading the template catalog
/// - Bootstrapping the session from a chosen template
/// - Running fill-protocol exchanges, one at a time
/// - Retrieving and saving artifacts
///
/// The session lock is never held across a backend call, so a concurrent
/// submit observes the in-flight flag and is rejected instead of queued.
/// Dropping a `select_template` or `send_message` future mid-call settles the
/// pending call as [`LexaError::Cancelled`].
pub struct DraftingService {
    backend: Arc<dyn ContractBackend>,
    sink: Arc<dyn ArtifactSink>,
    credential: Credential,
    session: Arc<RwLock<DraftingSession>>,
}

impl DraftingService {
    /// Creates a service with a fresh session.
    ///
    /// # Arguments
    ///
    /// * `backend` - Remote drafting endpoints
    /// * `sink` - Destination for downloaded artifacts
    /// * `credential` - Bearer credential sent with every call
    pub fn new(
        backend: Arc<dyn ContractBackend>,
        sink: Arc<dyn ArtifactSink>,
        credential: Credential,
    ) -> Self {
        Self {
            backend,
            sink,
            credential,
            session: Arc::new(RwLock::new(DraftingSession::new())),
        }
    }

    // ============================================================================
    // Template catalog access
    // ============================================================================

    /// Lists templates, logging failures and returning an empty list instead.
    pub async fn list_templates(&self) -> Vec<Template> {
        match self.try_list_templates().await {
            Ok(templates) => templates,
            Err(e) => {
                tracing::warn!("[Drafting] Failed to fetch contract templates: {}", e);
                Vec::new()
            }
        }
    }

    /// Lists templates, returning the backend error to the caller.
    pub async fn try_list_templates(&self) -> Result<Vec<Template>> {
        let templates = self.backend.list_templates(&self.credential).await?;
        tracing::debug!("[Drafting] Fetched {} contract templates", templates.len());
        Ok(templates)
    }

    // ============================================================================
    // Session bootstrap
    // ============================================================================

    /// Selects a template and bootstraps the session from it.
    ///
    /// A failed resolve is not an error here: it is recorded as an assistant
    /// turn and the session continues in degraded mode.
    ///
    /// # Errors
    ///
    /// Returns precondition errors only (`NoTemplateSelected`,
    /// `TemplateAlreadySelected`); no request is sent in that case.
    pub async fn select_template(&self, template: Template) -> Result<Turn> {
        let filename = template.filename.clone();
        let session_id = {
            let mut session = self.session.write().await;
            session.select_template(template)?;
            session.id().to_string()
        };

        tracing::info!(
            "[Drafting] Session {} bootstrapping from template '{}'",
            session_id,
            filename
        );

        let pending = PendingGuard::new(&self.session, PendingCall::Bootstrap);
        let outcome = self
            .backend
            .resolve_template(&self.credential, &filename)
            .await;
        if let Err(e) = &outcome {
            tracing::warn!("[Drafting] Template bootstrap failed: {}", e);
        }

        let mut session = self.session.write().await;
        pending.disarm();
        let turn = session.apply_bootstrap(outcome)?.clone();
        Ok(turn)
    }

    // ============================================================================
    // Incremental fill protocol
    // ============================================================================

    /// Submits a user message and waits for the backend's answer.
    ///
    /// # Errors
    ///
    /// Returns precondition errors only (`EmptyMessage`, `NoTemplateSelected`,
    /// `ExchangeInFlight`). Backend failures come back as
    /// [`ExchangeOutcome::Failed`].
    pub async fn send_message(&self, message: &str) -> Result<ExchangeOutcome> {
        let request = {
            let mut session = self.session.write().await;
            session.begin_exchange(message)?
        };

        tracing::debug!(
            "[Drafting] Sending fill request ({} prior turns)",
            request.messages.len()
        );

        let pending = PendingGuard::new(&self.session, PendingCall::Exchange);
        let outcome = self.backend.fill_turn(&self.credential, &request).await;

        let mut session = self.session.write().await;
        pending.disarm();
        match outcome {
            Ok(reply) => {
                let turn = session.apply_fill(Ok(reply))?.clone();
                if let Some(link) = turn.artifact_link() {
                    tracing::info!("[Drafting] Backend produced artifact '{}'", link);
                }
                if let VariableState::Raw { error, .. } = session.variables() {
                    tracing::warn!("[Drafting] Continuing with undecoded variables: {}", error);
                }
                Ok(ExchangeOutcome::Replied(turn))
            }
            Err(error) => {
                tracing::warn!("[Drafting] Fill exchange failed: {}", error);
                let turn = session.apply_fill(Err(error.clone()))?.clone();
                Ok(ExchangeOutcome::Failed { turn, error })
            }
        }
    }

    // ============================================================================
    // Artifact retrieval
    // ============================================================================

    /// Fetches the artifact behind `link` and saves it through the sink.
    ///
    /// # Errors
    ///
    /// Any fetch or save failure is returned; nothing is retried.
    pub async fn download(&self, link: &str) -> Result<PathBuf> {
        let link = link.trim();
        if link.is_empty() {
            return Err(LexaError::internal("artifact link is empty"));
        }

        let artifact = self
            .backend
            .download_artifact(&self.credential, link)
            .await?;
        let path = self.sink.save(&artifact).await?;

        tracing::info!(
            "[Drafting] Saved artifact '{}' ({} bytes) to {}",
            artifact.filename,
            artifact.len(),
            path.display()
        );
        Ok(path)
    }

    /// Downloads the most recent artifact link in the transcript.
    pub async fn download_latest(&self) -> Result<PathBuf> {
        let link = {
            let session = self.session.read().await;
            session
                .transcript()
                .latest_artifact_link()
                .map(str::to_string)
        };
        let link = link.ok_or_else(|| LexaError::internal("no artifact link in this session yet"))?;
        self.download(&link).await
    }

    // ============================================================================
    // Session access
    // ============================================================================

    /// Discards the current session and starts an empty one.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeInFlight` while a request is outstanding.
    pub async fn reset(&self) -> Result<String> {
        let mut session = self.session.write().await;
        if session.is_busy() {
            return Err(LexaError::ExchangeInFlight);
        }
        *session = DraftingSession::new();
        tracing::info!("[Drafting] Started new session {}", session.id());
        Ok(session.id().to_string())
    }

    pub async fn snapshot(&self) -> DraftingSession {
        self.session.read().await.clone()
    }

    pub async fn transcript(&self) -> Transcript {
        self.session.read().await.transcript().clone()
    }

    pub async fn variables(&self) -> VariableState {
        self.session.read().await.variables().clone()
    }

    pub async fn phase(&self) -> DraftPhase {
        self.session.read().await.phase()
    }

    pub async fn is_busy(&self) -> bool {
        self.session.read().await.is_busy()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

//! Drafting session state machine.
//!
//! Pure and synchronous: every transition is driven by a discrete event
//! (template chosen, response received, error received). The async driver in
//! [`super::service`] performs the backend calls between transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{FillReply, FillRequest};
use crate::error::{LexaError, Result};
use crate::template::{Template, TemplateResolution};
use crate::transcript::{Transcript, Turn};
use crate::variables::VariableState;

/// Where a drafting session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftPhase {
    /// No template chosen; only catalog access and selection are valid.
    AwaitingTemplate,
    /// The template is being resolved.
    Bootstrapping,
    /// Steady state. `degraded` is set when bootstrap failed.
    Filling { degraded: bool },
}

/// Announcement appended once a template has been resolved.
pub fn template_announcement(template: &Template) -> String {
    format!(
        "Bạn đã chọn mẫu hợp đồng: {}. Hãy cung cấp thông tin để tôi có thể giúp bạn tạo hợp đồng",
        template.name
    )
}

/// State of one contract-drafting session.
///
/// Owns the transcript, the variable state and the template body. At most one
/// fill-protocol exchange is in flight at a time.
#[derive(Debug, Clone)]
pub struct DraftingSession {
    id: String,
    started_at: DateTime<Utc>,
    phase: DraftPhase,
    template: Option<Template>,
    variables: VariableState,
    content: String,
    transcript: Transcript,
    in_flight: bool,
}

impl Default for DraftingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftingSession {
    /// Creates an empty session awaiting a template.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            phase: DraftPhase::AwaitingTemplate,
            template: None,
            variables: VariableState::Unset,
            content: String::new(),
            transcript: Transcript::new(),
            in_flight: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn variables(&self) -> &VariableState {
        &self.variables
    }

    pub fn template_content(&self) -> &str {
        &self.content
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// True while a bootstrap or fill exchange awaits its response.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Whether a new message may be submitted right now.
    pub fn can_send(&self) -> bool {
        matches!(self.phase, DraftPhase::Filling { .. }) && !self.in_flight
    }

    // ============================================================================
    // Session bootstrap
    // ============================================================================

    /// Records the template choice and enters `Bootstrapping`.
    ///
    /// # Errors
    ///
    /// - `NoTemplateSelected` if the template has no filename
    /// - `TemplateAlreadySelected` if this session already has a template
    pub fn select_template(&mut self, template: Template) -> Result<()> {
        if !template.is_resolvable() {
            return Err(LexaError::NoTemplateSelected);
        }
        if let Some(current) = &self.template {
            return Err(LexaError::TemplateAlreadySelected(current.name.clone()));
        }

        self.template = Some(template);
        self.phase = DraftPhase::Bootstrapping;
        self.in_flight = true;
        Ok(())
    }

    /// Applies the bootstrap outcome and enters `Filling`.
    ///
    /// Success seeds variables and template body, then announces the template.
    /// Failure appends an error turn and leaves the session degraded but usable.
    pub fn apply_bootstrap(
        &mut self,
        outcome: std::result::Result<TemplateResolution, LexaError>,
    ) -> Result<&Turn> {
        if self.phase != DraftPhase::Bootstrapping {
            return Err(LexaError::internal(format!(
                "bootstrap result received in phase {:?}",
                self.phase
            )));
        }
        let template = self.template.as_ref().ok_or(LexaError::NoTemplateSelected)?;

        self.in_flight = false;
        let turn = match outcome {
            Ok(resolution) => {
                let announcement = template_announcement(template);
                self.variables = VariableState::decode(resolution.variables);
                self.content = resolution.content;
                self.phase = DraftPhase::Filling { degraded: false };
                Turn::assistant(announcement)
            }
            Err(error) => {
                self.phase = DraftPhase::Filling { degraded: true };
                Turn::assistant_error(&error)
            }
        };

        Ok(self.transcript.push(turn))
    }

    // ============================================================================
    // Incremental fill protocol
    // ============================================================================

    /// Starts a fill-protocol exchange for `message`.
    ///
    /// Appends the user turn immediately and returns the request to send. The
    /// request's `messages` is the transcript as it was before this message.
    ///
    /// # Errors
    ///
    /// All errors leave the session untouched:
    /// - `EmptyMessage` for empty or whitespace-only input
    /// - `NoTemplateSelected` before a template was chosen
    /// - `ExchangeInFlight` while bootstrap or another exchange is pending
    pub fn begin_exchange(&mut self, message: &str) -> Result<FillRequest> {
        if message.trim().is_empty() {
            return Err(LexaError::EmptyMessage);
        }
        match self.phase {
            DraftPhase::AwaitingTemplate => return Err(LexaError::NoTemplateSelected),
            DraftPhase::Bootstrapping => return Err(LexaError::ExchangeInFlight),
            DraftPhase::Filling { .. } => {}
        }
        if self.in_flight {
            return Err(LexaError::ExchangeInFlight);
        }

        let request = FillRequest {
            message: message.to_string(),
            variables: self.variables.to_wire(),
            messages: self.transcript.turns().to_vec(),
            content_template: self.content.clone(),
        };

        self.transcript.push(Turn::user(message));
        self.in_flight = true;
        Ok(request)
    }

    /// Completes the pending exchange.
    ///
    /// On success the variable state is replaced wholesale by the returned
    /// variables. On failure only an error turn is appended.
    pub fn apply_fill(
        &mut self,
        outcome: std::result::Result<FillReply, LexaError>,
    ) -> Result<&Turn> {
        if !self.in_flight || !matches!(self.phase, DraftPhase::Filling { .. }) {
            return Err(LexaError::internal("fill result received with no exchange pending"));
        }

        self.in_flight = false;
        let turn = match outcome {
            Ok(reply) => {
                let turn = Turn::assistant_with_link(reply.response.clone(), reply.link());
                self.variables = VariableState::decode(reply.variables);
                turn
            }
            Err(error) => Turn::assistant_error(&error),
        };

        Ok(self.transcript.push(turn))
    }
}

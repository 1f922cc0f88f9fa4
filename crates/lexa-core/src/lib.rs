//! Core domain for the Lexa contract-drafting client.
//!
//! A drafting session goes through template selection, a bootstrap call that
//! fetches the template's variables and body, then a loop of fill-protocol
//! exchanges. Each exchange sends the whole session state and receives the
//! updated variables plus, eventually, a link to the rendered contract.

pub mod auth;
pub mod backend;
pub mod config;
pub mod drafting;
pub mod error;
pub mod template;
pub mod transcript;
pub mod variables;

pub use auth::{AuthService, Credential, UserProfile};
pub use backend::{Artifact, ArtifactSink, ContractBackend, FillReply, FillRequest};
pub use config::ClientConfig;
pub use drafting::{DraftPhase, DraftingService, DraftingSession, ExchangeOutcome};
pub use error::{LexaError, Result};
pub use template::{Template, TemplateResolution};
pub use transcript::{Transcript, Turn, TurnRole};
pub use variables::{VariableSet, VariableState, VariablesWire};

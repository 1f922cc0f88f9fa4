//! Contract-drafting session.
//!
//! # Module Structure
//!
//! - `state`: synchronous state machine (`DraftingSession`, `DraftPhase`)
//! - `service`: async driver that performs backend calls between transitions

mod service;
mod state;


pub use service::{DraftingService, ExchangeOutcome};
pub use state::{DraftPhase, DraftingSession, template_announcement};

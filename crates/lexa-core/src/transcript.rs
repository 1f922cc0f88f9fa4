//! Conversation transcript for a drafting session.

use serde::{Deserialize, Serialize};

use crate::error::LexaError;

/// Prefix of assistant turns that report a failed request.
pub const ERROR_TURN_PREFIX: &str = "Lỗi: ";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in the transcript.
///
/// Serialized exactly as the backend expects it inside the `messages` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Artifact link; empty when the turn carries none.
    #[serde(default)]
    pub link: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            link: String::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::assistant_with_link(content, String::new())
    }

    pub fn assistant_with_link(content: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            link: link.into(),
        }
    }

    /// Assistant turn describing a failed request.
    pub fn assistant_error(error: &LexaError) -> Self {
        Self::assistant(format!("{}{}", ERROR_TURN_PREFIX, error.user_detail()))
    }

    /// The artifact link, if the backend emitted a non-empty one.
    pub fn artifact_link(&self) -> Option<&str> {
        let link = self.link.trim();
        (!link.is_empty()).then_some(link)
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// Ordered, append-only turn history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        // Just pushed, so the vector is non-empty.
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent non-empty artifact link, searching backwards.
    pub fn latest_artifact_link(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(Turn::artifact_link)
    }
}

//! Conversation transcript types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a turn produced an answer or an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Answered,
    Failed,
}

/// One question and the answer (or error text) shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Position in the session history, starting at 0.
    pub order: usize,
    pub question: String,
    /// Generated answer, or the user-facing error message when `status` is `Failed`.
    pub answer: String,
    pub status: TurnStatus,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn answered(order: usize, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::new(order, question.into(), answer.into(), TurnStatus::Answered)
    }

    pub fn failed(order: usize, question: impl Into<String>, error: impl ToString) -> Self {
        Self::new(order, question.into(), error.to_string(), TurnStatus::Failed)
    }

    fn new(order: usize, question: String, answer: String, status: TurnStatus) -> Self {
        Self { order, question, answer, status, asked_at: Utc::now() }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TurnStatus::Failed
    }
}

//! Reply: the message shape returned to chat users.
//!
//! DESIGN
//! ======
//! Every chat command answers with one `Reply`: a human-readable message and,
//! for failures, a grepable `E_*` code plus a retryable flag. Typed errors
//! become replies through the [`ErrorCode`] trait so handlers never format
//! error text by hand.

use serde::{Deserialize, Serialize};

use crate::engine::SequenceId;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error replies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// REPLY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<SequenceId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl Reply {
    /// Plain success text.
    pub fn text(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into(), sequence_id: None, retryable: false }
    }

    /// Structured failure from a typed error.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self {
            code: Some(err.error_code().to_string()),
            message: err.to_string(),
            sequence_id: None,
            retryable: err.retryable(),
        }
    }

    #[must_use]
    pub fn with_sequence_id(mut self, id: SequenceId) -> Self {
        self.sequence_id = Some(id);
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code.is_some()
    }
}

#[cfg(test)]
#[path = "reply_test.rs"]
mod tests;

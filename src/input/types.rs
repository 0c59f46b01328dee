//! Parsed macro types shared by the parser and the scheduler.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::reply::ErrorCode;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Canonical (lower-case) input identifier from a console layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(String);

impl ButtonId {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Hold `buttons` for `duration_ms`. An empty button set is a pure wait.
///
/// `joined` marks a later segment of one `+` group: buttons it shares with
/// the previous action stay held across the boundary. Between actions that
/// are not joined, a shared button is released and pressed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAction {
    pub buttons: BTreeSet<ButtonId>,
    pub duration_ms: u32,
    #[serde(default)]
    pub joined: bool,
}

impl InputAction {
    #[must_use]
    pub fn wait(duration_ms: u32) -> Self {
        Self { buttons: BTreeSet::new(), duration_ms, joined: false }
    }

    #[must_use]
    pub fn press<'a>(buttons: impl IntoIterator<Item = &'a str>, duration_ms: u32) -> Self {
        Self { buttons: buttons.into_iter().map(ButtonId::new).collect(), duration_ms, joined: false }
    }

    /// Mark this action as the continuation of the previous one.
    #[must_use]
    pub fn joined(mut self) -> Self {
        self.joined = true;
        self
    }

    #[must_use]
    pub fn is_wait(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Whether moving from `self` to `next` must release a button first.
    #[must_use]
    pub fn repressed_by(&self, next: &InputAction) -> bool {
        !next.joined && !self.buttons.is_disjoint(&next.buttons)
    }
}

/// An immutable, non-empty list of actions. Cloning shares the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBody {
    actions: Arc<[InputAction]>,
    total_ms: u64,
}

impl MacroBody {
    /// Wrap a parsed action list. Returns `None` for an empty list.
    #[must_use]
    pub fn new(actions: Vec<InputAction>) -> Option<Self> {
        if actions.is_empty() {
            return None;
        }
        let total_ms = actions.iter().map(|a| u64::from(a.duration_ms)).sum();
        Some(Self { actions: actions.into(), total_ms })
    }

    #[must_use]
    pub fn actions(&self) -> &[InputAction] {
        &self.actions
    }

    /// Sum of every action's duration.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why a macro was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorReason {
    #[error("macro is empty")]
    Empty,
    #[error("unknown input '{0}'")]
    UnknownInput(String),
    #[error("malformed duration '{0}'")]
    MalformedDuration(String),
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("wait needs a duration, e.g. WAIT:200")]
    MissingWaitDuration,
    #[error("missing input next to '+'")]
    EmptySimultaneous,
    #[error("macro lasts {total_ms}ms, over the {max_ms}ms limit")]
    TooLong { total_ms: u64, max_ms: u64 },
}

/// A rejected macro. `token_index` is 0-based; the message shows it 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at token {}", .token_index + 1)]
pub struct ParseError {
    pub reason: ParseErrorReason,
    pub token_index: usize,
}

impl ParseError {
    #[must_use]
    pub fn new(reason: ParseErrorReason, token_index: usize) -> Self {
        Self { reason, token_index }
    }
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        "E_PARSE"
    }
}

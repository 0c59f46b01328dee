//! Chat adapter routes.
//!
//! DESIGN
//! ======
//! One chat line in, one reply out. Lines starting with `!` are commands,
//! matched case-insensitively on their first word; every other line is macro
//! text. Only the gateway decides whether a caller may act; this layer maps
//! outcomes to HTTP status codes and reply text.

use std::fmt::Write;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{SequenceStatus, SequenceView, UserId};
use crate::gateway::GatewayError;
use crate::input::ButtonId;
use crate::reply::{ErrorCode, Reply};
use crate::state::AppState;

const COMMAND_PREFIX: char = '!';

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    /// `!stopall`: release the controller and restart running macros.
    StopAll,
    /// `!runninginputs`: report the running count.
    RunningInputs,
    /// `!inputs`: list identifiers in the active layout.
    ListInputs,
    Unknown(&'a str),
    Macro(&'a str),
}

/// Classify one chat line.
#[must_use]
pub fn classify(message: &str) -> ChatCommand<'_> {
    let trimmed = message.trim();
    let Some(rest) = trimmed.strip_prefix(COMMAND_PREFIX) else {
        return ChatCommand::Macro(trimmed);
    };
    let name = rest.split_whitespace().next().unwrap_or_default();
    match name.to_ascii_lowercase().as_str() {
        "stopall" => ChatCommand::StopAll,
        "runninginputs" => ChatCommand::RunningInputs,
        "inputs" => ChatCommand::ListInputs,
        _ => ChatCommand::Unknown(name),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown command '!{0}'")]
pub struct UnknownCommand(String);

impl ErrorCode for UnknownCommand {
    fn error_code(&self) -> &'static str {
        "E_UNKNOWN_COMMAND"
    }
}

pub(crate) fn gateway_error_to_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Parse(_) => StatusCode::BAD_REQUEST,
        GatewayError::PermissionDenied => StatusCode::FORBIDDEN,
    }
}

fn error_reply(err: &GatewayError) -> (StatusCode, Json<Reply>) {
    (gateway_error_to_status(err), Json(Reply::error_from(err)))
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
}

/// `POST /api/chat`: handle one chat line.
pub async fn post_chat(State(state): State<AppState>, Json(body): Json<ChatMessage>) -> (StatusCode, Json<Reply>) {
    let user = UserId::new(&body.user);
    let gateway = &state.gateway;
    let command = classify(&body.message);
    debug!(%user, ?command, "chat message");

    match command {
        ChatCommand::StopAll => match gateway.stop_then_resume(&user) {
            Ok(restarted) => (
                StatusCode::OK,
                Json(Reply::text(format!(
                    "Stopped all inputs; restarted {restarted} sequence{}.",
                    plural(restarted)
                ))),
            ),
            Err(e) => error_reply(&e),
        },
        ChatCommand::RunningInputs => {
            let running = gateway.running_count();
            let verb = if running == 1 { "is" } else { "are" };
            let mut text = format!("There {verb} {running} input sequence{} running.", plural(running));
            let queued = gateway.queued_count();
            if queued > 0 {
                let _ = write!(text, " {queued} waiting.");
            }
            (StatusCode::OK, Json(Reply::text(text)))
        }
        ChatCommand::ListInputs => {
            let layout = gateway.scheduler().layout();
            let names: Vec<&str> = layout.identifiers().map(ButtonId::as_str).collect();
            let text = format!("Inputs for {}: {}", layout.name(), names.join(", "));
            (StatusCode::OK, Json(Reply::text(text)))
        }
        ChatCommand::Unknown(name) => {
            let err = UnknownCommand(name.to_owned());
            (StatusCode::BAD_REQUEST, Json(Reply::error_from(&err)))
        }
        ChatCommand::Macro(text) => match gateway.submit(&user, text) {
            Ok(id) => (StatusCode::ACCEPTED, Json(Reply::text("Inputs accepted.").with_sequence_id(id))),
            Err(e) => error_reply(&e),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct InputsResponse {
    pub running: usize,
    pub queued: usize,
    pub sequences: Vec<SequenceView>,
}

/// `GET /api/inputs`: running and queued counts with per-sequence progress.
pub async fn list_inputs(State(state): State<AppState>) -> Json<InputsResponse> {
    let sequences = state.gateway.active();
    let running = sequences
        .iter()
        .filter(|s| s.status == SequenceStatus::Running)
        .count();
    Json(InputsResponse { running, queued: sequences.len() - running, sequences })
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

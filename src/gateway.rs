//! Execution gateway: the public face of the scheduler.
//!
//! DESIGN
//! ======
//! Adapters never reach the scheduler directly. The gateway checks the
//! caller's ability first, so a denied caller learns nothing about whether
//! their macro would have parsed. It resolves the user's default duration
//! before parsing and admits the result. No other logic lives here.

use std::sync::Arc;

use tracing::{debug, info};

use crate::directory::{Ability, InputPreferences, Permissions};
use crate::engine::{Scheduler, SequenceId, SequenceView, StopSnapshot, UserId};
use crate::input::{ParseError, ParseOptions, parse};
use crate::reply::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("you don't have permission to do that")]
    PermissionDenied,
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::PermissionDenied => "E_PERMISSION_DENIED",
        }
    }
}

/// Parser limits applied to every submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    /// Fallback for users without a duration preference.
    pub default_duration_ms: u32,
    /// Longest macro accepted. `None` means unlimited.
    pub max_total_ms: Option<u64>,
}

pub struct ExecutionGateway {
    scheduler: Scheduler,
    permissions: Arc<dyn Permissions>,
    preferences: Arc<dyn InputPreferences>,
    limits: InputLimits,
}

impl ExecutionGateway {
    #[must_use]
    pub fn new(
        scheduler: Scheduler,
        permissions: Arc<dyn Permissions>,
        preferences: Arc<dyn InputPreferences>,
        limits: InputLimits,
    ) -> Self {
        Self { scheduler, permissions, preferences, limits }
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn require(&self, user: &UserId, ability: Ability) -> Result<(), GatewayError> {
        if self.permissions.has_ability(user, ability) {
            return Ok(());
        }
        debug!(%user, ability = ability.as_str(), "permission denied");
        Err(GatewayError::PermissionDenied)
    }

    /// Parse `text` with the user's preferred default duration and admit it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PermissionDenied`] if the user may not execute
    /// inputs, or [`GatewayError::Parse`] if the text is not a valid macro.
    pub fn submit(&self, user: &UserId, text: &str) -> Result<SequenceId, GatewayError> {
        self.require(user, Ability::ExecuteInputs)?;
        let default_duration_ms = self
            .preferences
            .default_input_duration_ms(user)
            .unwrap_or(self.limits.default_duration_ms);
        let options = ParseOptions { default_duration_ms, max_total_ms: self.limits.max_total_ms };
        let body = parse(text, self.scheduler.layout(), options)?;
        Ok(self.scheduler.admit(body, user.clone()))
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.scheduler.running_count()
    }

    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.scheduler.queued_count()
    }

    #[must_use]
    pub fn active(&self) -> Vec<SequenceView> {
        self.scheduler.active()
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::PermissionDenied`] without the stop ability.
    pub fn stop_all(&self, user: &UserId) -> Result<StopSnapshot, GatewayError> {
        self.require(user, Ability::StopAllInputs)?;
        info!(%user, "stop requested");
        Ok(self.scheduler.stop_all())
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::PermissionDenied`] without the stop ability.
    pub fn resume_all(&self, user: &UserId, snapshot: StopSnapshot) -> Result<usize, GatewayError> {
        self.require(user, Ability::StopAllInputs)?;
        Ok(self.scheduler.resume_all(snapshot))
    }

    /// Release the controller once and restart every running macro.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PermissionDenied`] without the stop ability.
    pub fn stop_then_resume(&self, user: &UserId) -> Result<usize, GatewayError> {
        self.require(user, Ability::StopAllInputs)?;
        info!(%user, "stop and restart requested");
        Ok(self.scheduler.stop_then_resume())
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

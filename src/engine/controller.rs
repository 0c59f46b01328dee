//! Controller port: the one shared device every sequence drives.
//!
//! DESIGN
//! ======
//! `ControllerTickState` is derived fresh each tick from the running
//! sequences. Buttons merge by union. Axis directions merge by overwrite in
//! admission order, so the most recently admitted sequence wins an axis for
//! that tick and the port never sees two directions on one axis.
//!
//! The port is written only by the tick loop. `apply` must be idempotent for
//! an unchanged state; the tick loop bounds each call by one tick period.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::input::{Binding, ButtonId, ConsoleLayout, Direction, InputAction};
use crate::reply::ErrorCode;

// =============================================================================
// TICK STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerTickState {
    /// Held plain buttons.
    pub buttons: BTreeSet<ButtonId>,
    /// Held direction per axis name. Absent axes are centered.
    pub axes: BTreeMap<String, Direction>,
}

impl ControllerTickState {
    /// Everything released, every axis centered.
    #[must_use]
    pub fn released() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.buttons.is_empty() && self.axes.is_empty()
    }

    /// Merge one sequence's action into this tick. Call in admission order.
    pub fn hold(&mut self, action: &InputAction, layout: &ConsoleLayout) {
        for id in &action.buttons {
            match layout.binding(id) {
                Some(Binding::Axis { axis, direction }) => {
                    self.axes.insert(axis.clone(), *direction);
                }
                Some(Binding::Button) | None => {
                    self.buttons.insert(id.clone());
                }
            }
        }
    }
}

// =============================================================================
// PORT
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("controller unavailable: {0}")]
    Unavailable(String),
    #[error("controller did not accept the tick within {0:?}")]
    Stalled(Duration),
}

impl ErrorCode for ControllerError {
    fn error_code(&self) -> &'static str {
        "E_CONTROLLER_UNAVAILABLE"
    }

    fn retryable(&self) -> bool {
        true
    }
}

/// Device driver seam. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ControllerPort: Send + Sync {
    /// Apply the merged state for one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] if the device cannot accept the state.
    async fn apply(&self, state: &ControllerTickState) -> Result<(), ControllerError>;
}

// =============================================================================
// VIRTUAL CONTROLLER
// =============================================================================

/// Controller that records state changes to the log instead of a device.
/// Re-applying an unchanged state is silent.
pub struct VirtualController {
    current: Mutex<ControllerTickState>,
}

impl VirtualController {
    #[must_use]
    pub fn new() -> Self {
        Self { current: Mutex::new(ControllerTickState::released()) }
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> ControllerTickState {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for VirtualController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ControllerPort for VirtualController {
    async fn apply(&self, state: &ControllerTickState) -> Result<(), ControllerError> {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *current != *state {
            info!(buttons = ?state.buttons, axes = ?state.axes, "controller state changed");
            current.clone_from(state);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

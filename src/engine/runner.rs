//! Sequence runner: one macro's progress through the shared tick clock.
//!
//! DESIGN
//! ======
//! The runner never owns a timer. The scheduler calls [`SequenceRunner::step`]
//! once per tick with the tick period, so every runner shares one time base
//! and their outputs can be merged deterministically. Progress lives in
//! `elapsed_ms` and an action cursor; the action list itself is never touched.
//!
//! Each tick reports the current action and adds one period to its offset.
//! Once the offset reaches the action's duration the cursor moves on and the
//! overflow carries into the next action, capped so that action still gets
//! its own tick. Every action is therefore reported for at least one tick,
//! and a 1000ms macro at a 100ms period reports buttons for exactly ten ticks.
//!
//! Two neighbouring actions that share a button, like `a a`, would otherwise
//! hold it without a gap. Unless the later action is a joined segment of the
//! same `+` group, the runner inserts one [`Step::Release`] tick between them.
//! That tick counts toward `elapsed_ms` but not toward any action.

use std::sync::Arc;

use tokio::sync::watch;

use super::sequence::SequenceStatus;
use crate::input::{InputAction, MacroBody};

// =============================================================================
// CANCEL TOKEN
// =============================================================================

/// One-shot cancellation signal, observed cooperatively once per tick.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Flip the token. Returns `true` only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// What one runner contributes to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Hold the action's buttons for this tick.
    Hold(&'a InputAction),
    /// Hold nothing so a re-pressed button is seen released.
    Release,
    /// Not running, or cancelled.
    Idle,
}

#[derive(Debug)]
pub struct SequenceRunner {
    body: MacroBody,
    status: SequenceStatus,
    cancel: CancelToken,
    elapsed_ms: u64,
    action_index: usize,
    offset_ms: u64,
    release_pending: bool,
}

impl SequenceRunner {
    #[must_use]
    pub fn new(body: MacroBody) -> Self {
        Self {
            body,
            status: SequenceStatus::Queued,
            cancel: CancelToken::new(),
            elapsed_ms: 0,
            action_index: 0,
            offset_ms: 0,
            release_pending: false,
        }
    }

    /// `Queued → Running`. Returns `false` from any other status.
    pub fn start(&mut self) -> bool {
        if self.status != SequenceStatus::Queued {
            return false;
        }
        self.status = SequenceStatus::Running;
        true
    }

    /// Advance one tick and return what the runner holds during it.
    ///
    /// Returns [`Step::Idle`] when the runner is not running or was
    /// cancelled; a cancelled runner contributes no buttons from that tick
    /// onward.
    pub fn step(&mut self, period_ms: u64) -> Step<'_> {
        if self.status != SequenceStatus::Running {
            return Step::Idle;
        }
        if self.cancel.is_cancelled() {
            self.status = SequenceStatus::Cancelled;
            return Step::Idle;
        }

        self.elapsed_ms += period_ms;
        if self.release_pending {
            self.release_pending = false;
            return Step::Release;
        }

        let actions = self.body.actions();
        let Some(action) = actions.get(self.action_index) else {
            self.status = SequenceStatus::Completed;
            return Step::Idle;
        };

        self.offset_ms += period_ms;
        let duration = u64::from(action.duration_ms);
        if self.offset_ms >= duration {
            let overflow = self.offset_ms - duration;
            self.action_index += 1;
            self.offset_ms = 0;
            match actions.get(self.action_index) {
                Some(next) if action.repressed_by(next) => self.release_pending = true,
                Some(next) => self.offset_ms = overflow.min(u64::from(next.duration_ms).saturating_sub(1)),
                None => self.status = SequenceStatus::Completed,
            }
        }
        Step::Hold(action)
    }

    #[must_use]
    pub fn status(&self) -> SequenceStatus {
        self.status
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Simulated milliseconds consumed so far.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    #[must_use]
    pub fn action_index(&self) -> usize {
        self.action_index
    }

    /// Mark cancelled without waiting for the next tick. Used by stop-all,
    /// which releases everything under the scheduler lock.
    pub(crate) fn force_cancel(&mut self) {
        self.cancel.cancel();
        self.status = SequenceStatus::Cancelled;
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

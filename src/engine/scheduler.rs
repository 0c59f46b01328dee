//! Scheduler: admission, per-tick merge, and global stop/resume.
//!
//! DESIGN
//! ======
//! All sequence state sits behind one mutex shared by the public methods and
//! [`Scheduler::tick`]. Public methods only mutate the handle set and return;
//! they never touch the controller. The tick loop calls `tick`, which advances
//! every runner, merges their actions in admission order, and hands the merged
//! state back to be applied outside the lock.
//!
//! STOP / RESUME
//! =============
//! `stop_all` cancels and removes every running handle and arms a release
//! tick: the next `tick` returns an all-released state and advances nothing.
//! The whole stop happens under the lock, so no tick observes a half-stopped
//! set. `resume_all` restarts captured sequences from their first action
//! with fresh ids. `stop_then_resume` does both under one lock, so the
//! running count is never observable as zero between the halves.
//!
//! TRADE-OFFS
//! ==========
//! A free slot admits straight into Running (first window sampled on the
//! next tick) so the count reflects a submission immediately. Only sequences
//! over the configured cap wait in the FIFO queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::controller::ControllerTickState;
use super::runner::{SequenceRunner, Step};
use super::sequence::{InputSequence, SequenceId, SequenceStatus, UserId};
use crate::input::{ConsoleLayout, MacroBody};

// =============================================================================
// TYPES
// =============================================================================

pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Simulated time advanced per tick. Raised to [`MIN_TICK_PERIOD`] when smaller.
    pub tick_period: Duration,
    /// Maximum concurrently running sequences. `None` means no cap.
    pub max_running: Option<usize>,
}

/// One captured sequence and how far it had progressed when stopped.
#[derive(Debug, Clone)]
pub struct StopEntry {
    pub sequence: InputSequence,
    pub consumed_ms: u64,
}

/// Sequences captured by a global stop, in admission order.
#[derive(Debug, Clone, Default)]
pub struct StopSnapshot {
    entries: Vec<StopEntry>,
}

impl StopSnapshot {
    #[must_use]
    pub fn entries(&self) -> &[StopEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only view of an active sequence for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceView {
    pub id: SequenceId,
    pub owner: UserId,
    pub status: SequenceStatus,
    pub created_at: i64,
    pub elapsed_ms: u64,
    pub total_ms: u64,
    pub action_index: usize,
    pub text: String,
}

struct RunningHandle {
    sequence: InputSequence,
    /// Monotonic admission number; merge order and FIFO tie-breaker.
    admission: u64,
    runner: SequenceRunner,
}

impl RunningHandle {
    fn view(&self) -> SequenceView {
        SequenceView {
            id: self.sequence.id,
            owner: self.sequence.owner.clone(),
            status: self.sequence.status,
            created_at: self.sequence.created_at,
            elapsed_ms: self.runner.elapsed_ms(),
            total_ms: self.sequence.body.total_ms(),
            action_index: self.runner.action_index(),
            text: crate::input::format(&self.sequence.body),
        }
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Cheap to clone; all clones share one handle set.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    layout: Arc<ConsoleLayout>,
    config: SchedulerConfig,
}

struct SchedulerInner {
    next_admission: u64,
    /// Running handles sorted by admission number.
    running: Vec<RunningHandle>,
    queued: VecDeque<RunningHandle>,
    /// Set by a stop; the next tick applies an all-released state.
    release_pending: bool,
}

impl Scheduler {
    /// Periods below [`MIN_TICK_PERIOD`] are raised to it; runners count
    /// whole milliseconds and would never advance.
    #[must_use]
    pub fn new(layout: Arc<ConsoleLayout>, mut config: SchedulerConfig) -> Self {
        config.tick_period = config.tick_period.max(MIN_TICK_PERIOD);
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                next_admission: 0,
                running: Vec::new(),
                queued: VecDeque::new(),
                release_pending: false,
            })),
            layout,
            config,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &Arc<ConsoleLayout> {
        &self.layout
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.config.tick_period
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a parsed body. Runs immediately if a slot is free and nothing
    /// is waiting, otherwise joins the back of the queue.
    pub fn admit(&self, body: MacroBody, owner: UserId) -> SequenceId {
        let sequence = InputSequence::new(owner, body);
        let id = sequence.id;
        let mut inner = self.lock();
        let handle = inner.new_handle(sequence);
        let owner = handle.sequence.owner.clone();
        let status = if inner.queued.is_empty() && inner.has_free_slot(self.config.max_running) {
            inner.start(handle);
            SequenceStatus::Running
        } else {
            inner.queued.push_back(handle);
            SequenceStatus::Queued
        };
        let running = inner.running.len();
        drop(inner);
        debug!(sequence_id = %id, %owner, ?status, running, "sequence admitted");
        id
    }

    /// Number of sequences currently Running.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.lock().running.len()
    }

    /// Number of sequences waiting for a slot.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.lock().queued.len()
    }

    /// Running sequences in admission order, then the queue in FIFO order.
    #[must_use]
    pub fn active(&self) -> Vec<SequenceView> {
        let inner = self.lock();
        inner
            .running
            .iter()
            .chain(inner.queued.iter())
            .map(RunningHandle::view)
            .collect()
    }

    /// Cancel one sequence. A queued sequence is dropped now; a running one
    /// releases its buttons on the next tick.
    pub fn cancel(&self, id: SequenceId) -> bool {
        let mut inner = self.lock();
        if let Some(pos) = inner.queued.iter().position(|h| h.sequence.id == id) {
            inner.queued.remove(pos);
            debug!(sequence_id = %id, "queued sequence cancelled");
            return true;
        }
        inner
            .running
            .iter()
            .find(|h| h.sequence.id == id)
            .is_some_and(|h| h.runner.cancel_token().cancel())
    }

    /// Cancel every running sequence and release the controller on the next
    /// tick. Queued sequences are untouched.
    pub fn stop_all(&self) -> StopSnapshot {
        let snapshot = self.lock().stop();
        info!(stopped = snapshot.len(), "all running inputs stopped");
        snapshot
    }

    /// Re-admit captured sequences from their first action, in order.
    pub fn resume_all(&self, snapshot: StopSnapshot) -> usize {
        let resumed = self.lock().resume(snapshot, self.config.max_running);
        info!(resumed, "stopped inputs resumed");
        resumed
    }

    /// Stop and immediately restart every running sequence as one step.
    pub fn stop_then_resume(&self) -> usize {
        let mut inner = self.lock();
        let snapshot = inner.stop();
        let stopped = snapshot.len();
        let resumed = inner.resume(snapshot, self.config.max_running);
        drop(inner);
        info!(stopped, resumed, "all running inputs restarted");
        resumed
    }

    /// Controller-fault path: stop everything and discard the snapshot.
    pub fn abort_all(&self) -> usize {
        self.lock().stop().len()
    }

    /// Advance every running sequence by one period and merge the result.
    pub fn tick(&self) -> ControllerTickState {
        let period_ms = u64::try_from(self.config.tick_period.as_millis()).unwrap_or(u64::MAX);
        let mut inner = self.lock();

        // PHASE: RELEASE TICK
        // WHY: a stop must reach the device as an all-released state before
        // any restarted sequence presses again.
        if std::mem::take(&mut inner.release_pending) {
            return ControllerTickState::released();
        }

        inner.promote(self.config.max_running);

        // PHASE: ADVANCE + MERGE in admission order (later admission wins axes).
        let mut state = ControllerTickState::default();
        for handle in &mut inner.running {
            if let Step::Hold(action) = handle.runner.step(period_ms) {
                state.hold(action, &self.layout);
            }
            handle.sequence.status = handle.runner.status();
        }

        inner.running.retain(|h| {
            if !h.sequence.status.is_terminal() {
                return true;
            }
            debug!(
                sequence_id = %h.sequence.id,
                owner = %h.sequence.owner,
                status = ?h.sequence.status,
                elapsed_ms = h.runner.elapsed_ms(),
                "sequence finished"
            );
            false
        });

        state
    }
}

// =============================================================================
// INNER
// =============================================================================

impl SchedulerInner {
    fn new_handle(&mut self, sequence: InputSequence) -> RunningHandle {
        let admission = self.next_admission;
        self.next_admission += 1;
        let runner = SequenceRunner::new(sequence.body.clone());
        RunningHandle { sequence, admission, runner }
    }

    fn has_free_slot(&self, cap: Option<usize>) -> bool {
        cap.is_none_or(|max| self.running.len() < max)
    }

    fn start(&mut self, mut handle: RunningHandle) {
        handle.runner.start();
        handle.sequence.status = SequenceStatus::Running;
        let pos = self
            .running
            .partition_point(|h| h.admission < handle.admission);
        self.running.insert(pos, handle);
    }

    fn promote(&mut self, cap: Option<usize>) {
        while self.has_free_slot(cap) {
            let Some(handle) = self.queued.pop_front() else {
                break;
            };
            debug!(sequence_id = %handle.sequence.id, "queued sequence started");
            self.start(handle);
        }
    }

    fn stop(&mut self) -> StopSnapshot {
        let entries = self
            .running
            .drain(..)
            .map(|mut h| {
                h.runner.force_cancel();
                h.sequence.status = SequenceStatus::Cancelled;
                StopEntry { consumed_ms: h.runner.elapsed_ms(), sequence: h.sequence }
            })
            .collect();
        self.release_pending = true;
        StopSnapshot { entries }
    }

    fn resume(&mut self, snapshot: StopSnapshot, cap: Option<usize>) -> usize {
        let count = snapshot.len();
        let mut overflow = Vec::new();
        for entry in snapshot.entries {
            let fresh = InputSequence::new(entry.sequence.owner, entry.sequence.body);
            let handle = self.new_handle(fresh);
            if overflow.is_empty() && self.has_free_slot(cap) {
                self.start(handle);
            } else {
                overflow.push(handle);
            }
        }
        // EDGE: overflow was admitted before anything still queued; keep it ahead.
        for handle in overflow.into_iter().rev() {
            self.queued.push_front(handle);
        }
        count
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;

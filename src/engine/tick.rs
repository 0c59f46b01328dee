//! Tick loop: the only writer to the controller port.
//!
//! DESIGN
//! ======
//! A single background task ticks the scheduler at a fixed period and
//! applies the merged state once per tick. Missed ticks are skipped rather
//! than burst, so simulated time slows under load instead of racing ahead.
//!
//! ERROR HANDLING
//! ==============
//! A controller error or an `apply` that outlives one tick period is a
//! shared-resource fault: every running sequence is cancelled and the fault
//! is logged for operators. The loop keeps ticking; the next tick carries the
//! all-released state, so a recovered device starts from a clean slate.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::controller::{ControllerError, ControllerPort};
use super::scheduler::Scheduler;

/// Spawn the tick loop. Returns a handle for shutdown.
pub fn spawn_tick_loop(scheduler: Scheduler, port: Arc<dyn ControllerPort>) -> JoinHandle<()> {
    let period = scheduler.tick_period();
    info!(?period, "tick loop configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let _ = run_tick(&scheduler, port.as_ref()).await;
        }
    })
}

/// Run one tick: advance, merge, apply. Cancels everything on a fault.
///
/// # Errors
///
/// Returns the [`ControllerError`] that caused the fault.
pub async fn run_tick(scheduler: &Scheduler, port: &dyn ControllerPort) -> Result<(), ControllerError> {
    let state = scheduler.tick();
    let period = scheduler.tick_period();
    let result = match tokio::time::timeout(period, port.apply(&state)).await {
        Ok(applied) => applied,
        Err(_) => Err(ControllerError::Stalled(period)),
    };
    if let Err(e) = &result {
        let cancelled = scheduler.abort_all();
        error!(error = %e, cancelled, "controller fault; running inputs cancelled");
    }
    result
}

#[cfg(test)]
#[path = "tick_test.rs"]
mod tests;

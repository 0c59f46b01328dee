//! Input execution engine.
//!
//! ARCHITECTURE
//! ============
//! text → parser → `MacroBody` → [`Scheduler::admit`] → one
//! [`SequenceRunner`] per sequence → merged [`ControllerTickState`] per tick
//! → [`ControllerPort`]. The tick loop owns the port; everything else goes
//! through the scheduler's lock.

pub mod controller;
pub mod runner;
pub mod scheduler;
pub mod sequence;
pub mod tick;

pub use controller::{ControllerError, ControllerPort, ControllerTickState, VirtualController};
pub use runner::{CancelToken, SequenceRunner, Step};
pub use scheduler::{MIN_TICK_PERIOD, Scheduler, SchedulerConfig, SequenceView, StopEntry, StopSnapshot};
pub use sequence::{InputSequence, SequenceId, SequenceStatus, UserId};
pub use tick::{run_tick, spawn_tick_loop};

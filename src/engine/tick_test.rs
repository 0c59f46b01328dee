use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::engine::{ControllerTickState, SchedulerConfig, UserId};
use crate::input::{ConsoleLayout, ParseOptions};

#[derive(Default)]
struct RecordingPort {
    states: Mutex<Vec<ControllerTickState>>,
}

impl RecordingPort {
    fn states(&self) -> Vec<ControllerTickState> {
        self.states.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ControllerPort for RecordingPort {
    async fn apply(&self, state: &ControllerTickState) -> Result<(), ControllerError> {
        self.states.lock().unwrap().push(state.clone());
        Ok(())
    }
}

struct FailingPort;

#[async_trait::async_trait]
impl ControllerPort for FailingPort {
    async fn apply(&self, _state: &ControllerTickState) -> Result<(), ControllerError> {
        Err(ControllerError::Unavailable("unplugged".into()))
    }
}

struct StallingPort;

#[async_trait::async_trait]
impl ControllerPort for StallingPort {
    async fn apply(&self, _state: &ControllerTickState) -> Result<(), ControllerError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(())
    }
}

fn scheduler(period_ms: u64) -> Scheduler {
    Scheduler::new(
        Arc::new(ConsoleLayout::snes()),
        SchedulerConfig { tick_period: Duration::from_millis(period_ms), max_running: None },
    )
}

fn admit(scheduler: &Scheduler, text: &str, owner: &str) {
    let options = ParseOptions { default_duration_ms: 200, max_total_ms: None };
    let body = crate::input::parse(text, scheduler.layout(), options).expect("valid macro");
    scheduler.admit(body, UserId::new(owner));
}

#[tokio::test]
async fn run_tick_applies_merged_state() {
    let scheduler = scheduler(50);
    admit(&scheduler, "a:100", "alice");
    admit(&scheduler, "b:50", "bob");
    let port = RecordingPort::default();

    run_tick(&scheduler, &port).await.unwrap();
    run_tick(&scheduler, &port).await.unwrap();
    run_tick(&scheduler, &port).await.unwrap();

    let held: Vec<usize> = port.states().iter().map(|s| s.buttons.len()).collect();
    assert_eq!(held, vec![2, 1, 0]);
    assert_eq!(scheduler.running_count(), 0);
}

#[tokio::test]
async fn controller_error_cancels_everything() {
    let scheduler = scheduler(50);
    admit(&scheduler, "a:1000", "alice");
    admit(&scheduler, "b:1000", "bob");

    let err = run_tick(&scheduler, &FailingPort).await.unwrap_err();
    assert!(matches!(err, ControllerError::Unavailable(_)));
    assert_eq!(scheduler.running_count(), 0);

    // Next tick on a healthy port starts from a released controller.
    let port = RecordingPort::default();
    run_tick(&scheduler, &port).await.unwrap();
    assert!(port.states()[0].is_released());
}

#[tokio::test]
async fn stalled_apply_is_a_fault() {
    let scheduler = scheduler(20);
    admit(&scheduler, "a:1000", "alice");

    let err = run_tick(&scheduler, &StallingPort).await.unwrap_err();
    assert!(matches!(err, ControllerError::Stalled(p) if p == Duration::from_millis(20)));
    assert_eq!(scheduler.running_count(), 0);
}

#[tokio::test]
async fn spawned_loop_drives_sequences_to_completion() {
    let scheduler = scheduler(5);
    admit(&scheduler, "a:20 b:20", "alice");
    let port = Arc::new(RecordingPort::default());

    let handle = spawn_tick_loop(scheduler.clone(), port.clone());
    for _ in 0..100 {
        if scheduler.running_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.abort();

    assert_eq!(scheduler.running_count(), 0);
    let states = port.states();
    assert!(states.iter().any(|s| s.buttons.iter().any(|b| b.as_str() == "a")));
    assert!(states.iter().any(|s| s.buttons.iter().any(|b| b.as_str() == "b")));
}

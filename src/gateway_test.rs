use std::collections::HashMap;
use std::time::Duration;

use super::*;
use crate::directory::UserDirectory;
use crate::engine::SchedulerConfig;
use crate::input::{ConsoleLayout, ParseErrorReason};

/// Grants every ability to "mod", inputs to everyone else except "banned".
struct StaticPermissions;

impl Permissions for StaticPermissions {
    fn has_ability(&self, user: &UserId, ability: Ability) -> bool {
        match user.as_str() {
            "mod" => true,
            "banned" => false,
            _ => ability == Ability::ExecuteInputs,
        }
    }
}

struct StaticPreferences(HashMap<&'static str, u32>);

impl InputPreferences for StaticPreferences {
    fn default_input_duration_ms(&self, user: &UserId) -> Option<u32> {
        self.0.get(user.as_str()).copied()
    }
}

fn gateway(max_total_ms: Option<u64>) -> ExecutionGateway {
    let scheduler = Scheduler::new(
        Arc::new(ConsoleLayout::snes()),
        SchedulerConfig { tick_period: Duration::from_millis(100), max_running: None },
    );
    ExecutionGateway::new(
        scheduler,
        Arc::new(StaticPermissions),
        Arc::new(StaticPreferences(HashMap::from([("slow", 400)]))),
        InputLimits { default_duration_ms: 200, max_total_ms },
    )
}

fn user(name: &str) -> UserId {
    UserId::new(name)
}

#[test]
fn submit_admits_and_counts() {
    let gw = gateway(None);
    gw.submit(&user("alice"), "A:500 WAIT:200 B:300").unwrap();
    gw.submit(&user("bob"), "start").unwrap();
    assert_eq!(gw.running_count(), 2);
    assert_eq!(gw.queued_count(), 0);
}

#[test]
fn empty_text_fails_without_changing_count() {
    let gw = gateway(None);
    let err = gw.submit(&user("alice"), "   ").unwrap_err();
    let GatewayError::Parse(parse_err) = &err else {
        panic!("expected parse error, got {err:?}");
    };
    assert_eq!(parse_err.reason, ParseErrorReason::Empty);
    assert_eq!(err.error_code(), "E_PARSE");
    assert_eq!(gw.running_count(), 0);
}

#[test]
fn parse_error_message_passes_through() {
    let gw = gateway(None);
    let err = gw.submit(&user("alice"), "a q").unwrap_err();
    assert_eq!(err.to_string(), "unknown input 'q' at token 2");
}

#[test]
fn user_preference_sets_default_duration() {
    let gw = gateway(None);
    gw.submit(&user("slow"), "a").unwrap();
    gw.submit(&user("alice"), "b").unwrap();
    let totals: Vec<u64> = gw.active().iter().map(|v| v.total_ms).collect();
    assert_eq!(totals, vec![400, 200]);
}

#[test]
fn max_total_limit_applies() {
    let gw = gateway(Some(1000));
    let err = gw.submit(&user("alice"), "a:600 b:600").unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Parse(ParseError { reason: ParseErrorReason::TooLong { .. }, token_index: 1 })
    ));
    assert_eq!(gw.running_count(), 0);
}

#[test]
fn denied_submit_checks_permission_before_parse() {
    let gw = gateway(None);
    let err = gw.submit(&user("banned"), "not a macro").unwrap_err();
    assert!(matches!(err, GatewayError::PermissionDenied));
    assert_eq!(err.error_code(), "E_PERMISSION_DENIED");
}

#[test]
fn stop_without_ability_is_denied_and_harmless() {
    let gw = gateway(None);
    gw.submit(&user("alice"), "a:1000").unwrap();

    let err = gw.stop_then_resume(&user("alice")).unwrap_err();
    assert!(matches!(err, GatewayError::PermissionDenied));
    assert!(!err.to_string().contains("stop-all-inputs"));
    assert_eq!(gw.running_count(), 1);

    assert!(gw.stop_all(&user("alice")).is_err());
    assert_eq!(gw.running_count(), 1);
}

#[test]
fn stop_then_resume_keeps_count() {
    let gw = gateway(None);
    gw.submit(&user("alice"), "a:1000").unwrap();
    gw.submit(&user("bob"), "b:1000").unwrap();
    assert_eq!(gw.stop_then_resume(&user("mod")).unwrap(), 2);
    assert_eq!(gw.running_count(), 2);
}

#[test]
fn stop_and_resume_as_separate_steps() {
    let gw = gateway(None);
    gw.submit(&user("alice"), "a:1000").unwrap();

    let snapshot = gw.stop_all(&user("mod")).unwrap();
    assert_eq!(gw.running_count(), 0);
    assert!(gw.resume_all(&user("alice"), snapshot.clone()).is_err());
    assert_eq!(gw.resume_all(&user("mod"), snapshot).unwrap(), 1);
    assert_eq!(gw.running_count(), 1);
}

#[test]
fn works_with_user_directory() {
    let dir = Arc::new(UserDirectory::open());
    let scheduler = Scheduler::new(
        Arc::new(ConsoleLayout::n64()),
        SchedulerConfig { tick_period: Duration::from_millis(10), max_running: Some(1) },
    );
    let gw = ExecutionGateway::new(
        scheduler,
        dir.clone(),
        dir,
        InputLimits { default_duration_ms: 200, max_total_ms: Some(60_000) },
    );
    gw.submit(&user("alice"), "z+cup:300").unwrap();
    gw.submit(&user("bob"), "a").unwrap();
    assert_eq!(gw.running_count(), 1);
    assert_eq!(gw.queued_count(), 1);
    assert!(gw.stop_all(&user("alice")).is_err());
}

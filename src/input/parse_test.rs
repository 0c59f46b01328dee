use super::*;

fn opts() -> ParseOptions {
    ParseOptions { default_duration_ms: 200, max_total_ms: Some(60_000) }
}

fn parse_snes(text: &str) -> Result<MacroBody, ParseError> {
    parse(text, &ConsoleLayout::snes(), opts())
}

fn reason(text: &str) -> (ParseErrorReason, usize) {
    let err = parse_snes(text).expect_err("parse should fail");
    (err.reason, err.token_index)
}

#[test]
fn parses_press_wait_press() {
    let body = parse_snes("A:500 WAIT:200 B:300").unwrap();
    assert_eq!(
        body.actions(),
        &[InputAction::press(["a"], 500), InputAction::wait(200), InputAction::press(["b"], 300)]
    );
    assert_eq!(body.total_ms(), 1000);
}

#[test]
fn missing_duration_uses_caller_default() {
    let custom = ParseOptions { default_duration_ms: 75, max_total_ms: None };
    let body = parse("a start", &ConsoleLayout::snes(), custom).unwrap();
    assert_eq!(body.actions(), &[InputAction::press(["a"], 75), InputAction::press(["start"], 75)]);
}

#[test]
fn identifiers_are_case_insensitive() {
    let body = parse_snes("StArT:100 wAiT:50").unwrap();
    assert_eq!(body.actions(), &[InputAction::press(["start"], 100), InputAction::wait(50)]);
}

#[test]
fn duration_suffixes() {
    let body = parse_snes("a:250ms b:2s x:40").unwrap();
    let durations: Vec<u32> = body.actions().iter().map(|a| a.duration_ms).collect();
    assert_eq!(durations, vec![250, 2000, 40]);
}

#[test]
fn group_members_release_at_their_own_duration() {
    let body = parse_snes("a:100+b:500 x").unwrap();
    assert_eq!(
        body.actions(),
        &[
            InputAction::press(["a", "b"], 100),
            InputAction::press(["b"], 400).joined(),
            InputAction::press(["x"], 200),
        ]
    );
    assert_eq!(body.total_ms(), 700);
}

#[test]
fn equal_group_durations_stay_one_action() {
    let body = parse_snes("a:300+b:300").unwrap();
    assert_eq!(body.actions(), &[InputAction::press(["a", "b"], 300)]);
}

#[test]
fn wait_member_extends_group_with_release() {
    let body = parse_snes("a:100+WAIT:300").unwrap();
    assert_eq!(body.actions(), &[InputAction::press(["a"], 100), InputAction::wait(200).joined()]);

    let body = parse_snes("wait:100+WAIT:300").unwrap();
    assert_eq!(body.actions(), &[InputAction::wait(300)]);
}

#[test]
fn repeated_group_member_keeps_longest_duration() {
    let body = parse_snes("a:300+a:100").unwrap();
    assert_eq!(body.actions(), &[InputAction::press(["a"], 300)]);
}

#[test]
fn adjacent_identical_actions_are_kept() {
    let body = parse_snes("a:100 a:100 a:100").unwrap();
    let actions = body.actions();
    assert_eq!(actions.len(), 3);
    assert!(actions.iter().all(|a| !a.joined));
    assert!(actions[0].repressed_by(&actions[1]));
}

#[test]
fn empty_and_whitespace_text_fail_at_index_zero() {
    assert_eq!(reason(""), (ParseErrorReason::Empty, 0));
    assert_eq!(reason("  \t "), (ParseErrorReason::Empty, 0));
}

#[test]
fn unknown_input_reports_token_index() {
    assert_eq!(reason("a+b q"), (ParseErrorReason::UnknownInput("q".into()), 2));
}

#[test]
fn malformed_durations_are_rejected() {
    assert_eq!(reason("a:-5"), (ParseErrorReason::MalformedDuration("-5".into()), 0));
    assert_eq!(reason("a b:+5"), (ParseErrorReason::MalformedDuration("+5".into()), 1));
    assert_eq!(reason("a:"), (ParseErrorReason::MalformedDuration(String::new()), 0));
    assert_eq!(reason("a:fast"), (ParseErrorReason::MalformedDuration("fast".into()), 0));
    assert_eq!(
        reason("a:99999999999"),
        (ParseErrorReason::MalformedDuration("99999999999".into()), 0)
    );
}

#[test]
fn zero_duration_is_rejected() {
    assert_eq!(reason("a:0"), (ParseErrorReason::ZeroDuration, 0));
    assert_eq!(reason("a WAIT:0ms"), (ParseErrorReason::ZeroDuration, 1));
}

#[test]
fn zero_default_duration_is_rejected() {
    let zero = ParseOptions { default_duration_ms: 0, max_total_ms: None };
    let err = parse("a", &ConsoleLayout::snes(), zero).unwrap_err();
    assert_eq!(err.reason, ParseErrorReason::ZeroDuration);
}

#[test]
fn wait_requires_duration() {
    assert_eq!(reason("a wait"), (ParseErrorReason::MissingWaitDuration, 1));
}

#[test]
fn dangling_plus_is_rejected() {
    assert_eq!(reason("a+"), (ParseErrorReason::EmptySimultaneous, 1));
    assert_eq!(reason("+a"), (ParseErrorReason::EmptySimultaneous, 0));
    assert_eq!(reason("a++b"), (ParseErrorReason::EmptySimultaneous, 1));
}

#[test]
fn total_duration_limit_reports_crossing_token() {
    let limited = ParseOptions { default_duration_ms: 200, max_total_ms: Some(1000) };
    let err = parse("a:600 b:300 x:200 y:100", &ConsoleLayout::snes(), limited).unwrap_err();
    assert_eq!(err.reason, ParseErrorReason::TooLong { total_ms: 1100, max_ms: 1000 });
    assert_eq!(err.token_index, 2);
}

#[test]
fn error_message_shows_one_based_position() {
    let err = parse_snes("a q").unwrap_err();
    assert_eq!(err.to_string(), "unknown input 'q' at token 2");
}

#[test]
fn format_then_parse_round_trips() {
    let samples = [
        "A:500 WAIT:200 B:300",
        "a+b:250 wait:1s start",
        "left:100 right:100 up+x:40ms",
        "l+r+select:16 WAIT:16 l+r+select:16",
    ];
    for text in samples {
        let first = parse_snes(text).unwrap();
        let again = parse_snes(&format(&first)).unwrap();
        assert_eq!(first.actions(), again.actions(), "round trip of {text:?}");
    }
}

#[test]
fn format_is_canonical() {
    let body = parse_snes("B:300+a:100 Wait:20").unwrap();
    assert_eq!(format(&body), "a:100+b:300 WAIT:20");

    let body = parse_snes("x:1s+WAIT:2s").unwrap();
    assert_eq!(format(&body), "x:1000+WAIT:2000");
}

/// Every word of one to three distinct members drawn from `TOKENS`.
fn generated_words() -> Vec<String> {
    const TOKENS: [&str; 8] = ["a", "b:40", "x:15ms", "y:1s", "WAIT:30", "l:250ms", "r:2s", "start:7"];
    let n = TOKENS.len();
    let mut words = Vec::new();
    for i in 0..n {
        words.push(TOKENS[i].to_string());
        for j in i + 1..n {
            words.push(format!("{}+{}", TOKENS[i], TOKENS[j]));
            for k in j + 1..n {
                words.push(format!("{}+{}+{}", TOKENS[i], TOKENS[j], TOKENS[k]));
            }
        }
    }
    words
}

#[test]
fn format_then_parse_round_trips_generated_macros() {
    let words = generated_words();
    let n = words.len();
    for i in 0..n {
        let text = format!("{} {} {}", words[i], words[(i * 7 + 3) % n], words[(i * 13 + 5) % n]);
        let body = parse_snes(&text).unwrap();
        let canonical = format(&body);
        let again = parse_snes(&canonical).unwrap();

        assert_eq!(body.actions(), again.actions(), "round trip of {text:?}");
        assert_eq!(body.total_ms(), again.total_ms(), "total of {text:?}");
        assert_eq!(format(&again), canonical, "canonical form of {text:?}");
        assert!(!body.actions()[0].joined);
    }
}

//! Macro text parser.
//!
//! GRAMMAR
//! =======
//! Whitespace separates words; `+` joins tokens into one simultaneous group.
//! Each token is `NAME`, `NAME:DURATION` or `WAIT:DURATION`, where DURATION
//! is an integer with an optional `ms` or `s` suffix.
//!
//! GROUPS
//! ======
//! Every member of a group is pressed at the group's start and released at
//! its own duration; the group lasts as long as its longest member. A group
//! is lowered into successive actions, one per release point, with every
//! segment after the first marked `joined` so the buttons still down are
//! never released between segments. `a:100+b:500` becomes `{a,b} 100ms`
//! followed by joined `{b} 400ms`. A button listed twice keeps its longest
//! duration.
//!
//! Token indexes in errors count `+` members individually across the whole
//! text, so `a+b q` reports the unknown `q` at index 2.

use std::collections::BTreeMap;

use super::layout::ConsoleLayout;
use super::types::{ButtonId, InputAction, MacroBody, ParseError, ParseErrorReason};

/// Reserved token for a pure wait.
pub const WAIT_TOKEN: &str = "wait";

/// Caller-supplied parsing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Used when a button token has no duration suffix.
    pub default_duration_ms: u32,
    /// Upper bound on the summed duration of the whole macro.
    pub max_total_ms: Option<u64>,
}

enum Token {
    Press(ButtonId, u32),
    Wait(u32),
}

/// Parse macro text into an immutable action list.
///
/// # Errors
///
/// Returns [`ParseError`] with the offending token index for empty text,
/// unknown identifiers, malformed or zero durations, dangling `+`, or a
/// total duration above `options.max_total_ms`.
pub fn parse(text: &str, layout: &ConsoleLayout, options: ParseOptions) -> Result<MacroBody, ParseError> {
    let mut actions = Vec::new();
    let mut token_index = 0usize;
    let mut total_ms = 0u64;

    for word in text.split_whitespace() {
        let mut group = Group::default();

        for member in word.split('+') {
            let index = token_index;
            token_index += 1;
            if member.is_empty() {
                return Err(ParseError::new(ParseErrorReason::EmptySimultaneous, index));
            }
            match parse_token(member, layout, options).map_err(|reason| ParseError::new(reason, index))? {
                Token::Press(id, ms) => group.press(id, ms),
                Token::Wait(ms) => group.wait_ms = group.wait_ms.max(ms),
            }
        }

        total_ms += u64::from(group.duration_ms());
        if let Some(max_ms) = options.max_total_ms {
            if total_ms > max_ms {
                return Err(ParseError::new(ParseErrorReason::TooLong { total_ms, max_ms }, token_index - 1));
            }
        }
        group.lower_into(&mut actions);
    }

    MacroBody::new(actions).ok_or_else(|| ParseError::new(ParseErrorReason::Empty, 0))
}

/// Members of one `+` group, before lowering.
#[derive(Default)]
struct Group {
    presses: BTreeMap<ButtonId, u32>,
    wait_ms: u32,
}

impl Group {
    fn press(&mut self, id: ButtonId, ms: u32) {
        let held = self.presses.entry(id).or_default();
        *held = (*held).max(ms);
    }

    fn duration_ms(&self) -> u32 {
        self.presses.values().copied().fold(self.wait_ms, u32::max)
    }

    /// One action per release point; later segments are `joined`.
    fn lower_into(self, actions: &mut Vec<InputAction>) {
        let mut release_points: Vec<u32> = self.presses.values().copied().collect();
        release_points.push(self.duration_ms());
        release_points.sort_unstable();
        release_points.dedup();

        let mut start = 0;
        for (i, end) in release_points.into_iter().enumerate() {
            let buttons = self
                .presses
                .iter()
                .filter(|(_, ms)| **ms > start)
                .map(|(id, _)| id.clone())
                .collect();
            actions.push(InputAction { buttons, duration_ms: end - start, joined: i > 0 });
            start = end;
        }
    }
}

fn parse_token(member: &str, layout: &ConsoleLayout, options: ParseOptions) -> Result<Token, ParseErrorReason> {
    let (name, duration) = match member.split_once(':') {
        Some((name, raw)) => (name, Some(raw)),
        None => (member, None),
    };

    if name.eq_ignore_ascii_case(WAIT_TOKEN) {
        let raw = duration.ok_or(ParseErrorReason::MissingWaitDuration)?;
        return parse_duration(raw).map(Token::Wait);
    }

    let id = layout
        .lookup(name)
        .ok_or_else(|| ParseErrorReason::UnknownInput(name.to_owned()))?;
    let ms = match duration {
        Some(raw) => parse_duration(raw)?,
        None if options.default_duration_ms == 0 => return Err(ParseErrorReason::ZeroDuration),
        None => options.default_duration_ms,
    };
    Ok(Token::Press(id, ms))
}

fn parse_duration(raw: &str) -> Result<u32, ParseErrorReason> {
    let malformed = || ParseErrorReason::MalformedDuration(raw.to_owned());
    let lower = raw.to_ascii_lowercase();
    let (digits, scale) = if let Some(d) = lower.strip_suffix("ms") {
        (d, 1)
    } else if let Some(d) = lower.strip_suffix('s') {
        (d, 1000)
    } else {
        (lower.as_str(), 1)
    };

    // EDGE: reject signs and empty digits up front; `u32::from_str` accepts "+5".
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let value = digits
        .parse::<u32>()
        .ok()
        .and_then(|v| v.checked_mul(scale))
        .ok_or_else(malformed)?;
    if value == 0 {
        return Err(ParseErrorReason::ZeroDuration);
    }
    Ok(value)
}

/// Serialize a body back to macro text that parses to the same actions.
///
/// A run of `joined` actions is folded back into one `+` group: each button
/// gets the summed duration of the segments that hold it, and a trailing
/// release-only segment becomes a `WAIT` member.
#[must_use]
pub fn format(body: &MacroBody) -> String {
    let actions = body.actions();
    let mut out = String::new();
    let mut start = 0;
    while start < actions.len() {
        let end = actions[start + 1..]
            .iter()
            .position(|a| !a.joined)
            .map_or(actions.len(), |p| start + 1 + p);
        if start > 0 {
            out.push(' ');
        }
        write_group(&mut out, &actions[start..end]);
        start = end;
    }
    out
}

fn write_group(out: &mut String, run: &[InputAction]) {
    let mut held: BTreeMap<&ButtonId, u32> = BTreeMap::new();
    for action in run {
        for id in &action.buttons {
            *held.entry(id).or_default() += action.duration_ms;
        }
    }
    let total: u32 = run.iter().map(|a| a.duration_ms).sum();
    let longest = held.values().copied().max().unwrap_or(0);

    let mut members: Vec<String> = held.iter().map(|(id, ms)| format!("{id}:{ms}")).collect();
    if longest < total {
        members.push(format!("WAIT:{total}"));
    }
    out.push_str(&members.join("+"));
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;

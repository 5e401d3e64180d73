//! The flat `.config` text format.
//!
//! ```text
//! CONFIG_NET=y
//! CONFIG_HZ=250
//! CONFIG_LOCALVERSION="-custom"
//! # CONFIG_DEBUG_INFO is not set
//! ```

use ktree::{Tristate, Value};

use crate::assignment::Assignment;

/// Prefix of every symbol name in the text format.
pub const CONFIG_PREFIX: &str = "CONFIG_";

const NOT_SET_SUFFIX: &str = " is not set";

/// Parse fragment text into assignments, in file order.
///
/// Values stay loosely typed until resolution narrows them to the symbol's
/// kind. Malformed lines are skipped with a warning.
pub fn parse(text: &str) -> Vec<Assignment> {
    let mut assignments = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let unset = comment
                .trim_start()
                .strip_prefix(CONFIG_PREFIX)
                .and_then(|rest| rest.strip_suffix(NOT_SET_SUFFIX))
                .filter(|name| is_symbol_name(name));
            if let Some(name) = unset {
                assignments.push(Assignment::new(name, Value::N));
            }
            continue;
        }

        let parsed = line
            .strip_prefix(CONFIG_PREFIX)
            .and_then(|rest| rest.split_once('='))
            .filter(|(name, _)| is_symbol_name(name));
        match parsed {
            Some((name, raw)) => assignments.push(Assignment::new(name, parse_value(raw))),
            None => warn!("line {}: cannot parse `{line}`, skipped", lineno + 1),
        }
    }
    assignments
}

/// Parse the right-hand side of a `CONFIG_<NAME>=` line.
pub fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(t) = Tristate::from_literal(raw) {
        return Value::Tristate(t);
    }
    match raw
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => Value::String(unescape(inner)),
        None => Value::String(raw.to_string()),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn is_symbol_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render one line per assignment; `n` becomes the `is not set` comment.
pub fn render(assignments: &[Assignment]) -> String {
    let mut out = String::new();
    for assignment in assignments {
        let line = match &assignment.value {
            Value::Tristate(Tristate::Off) => {
                format!("# {CONFIG_PREFIX}{}{NOT_SET_SUFFIX}\n", assignment.symbol)
            }
            value => format!("{CONFIG_PREFIX}{}={value}\n", assignment.symbol),
        };
        out.push_str(&line);
    }
    out
}

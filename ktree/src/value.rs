use std::{fmt, ops::Not};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Three-valued logic used by bool and tristate symbols.
///
/// Ordered `Off < Module < On`, so AND is `min` and OR is `max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Tristate {
    /// `n`
    #[serde(rename = "n")]
    Off,
    /// `m`
    #[serde(rename = "m")]
    Module,
    /// `y`
    #[serde(rename = "y")]
    On,
}

impl Tristate {
    /// Parse `y`, `m` or `n`.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "y" => Some(Tristate::On),
            "m" => Some(Tristate::Module),
            "n" => Some(Tristate::Off),
            _ => None,
        }
    }

    /// The `.config` spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Tristate::Off => "n",
            Tristate::Module => "m",
            Tristate::On => "y",
        }
    }
}

impl Not for Tristate {
    type Output = Tristate;

    fn not(self) -> Tristate {
        match self {
            Tristate::Off => Tristate::On,
            Tristate::Module => Tristate::Module,
            Tristate::On => Tristate::Off,
        }
    }
}

impl From<bool> for Tristate {
    fn from(b: bool) -> Self {
        if b { Tristate::On } else { Tristate::Off }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// `y` or `n`.
    Bool,
    /// `y`, `m` or `n`.
    Tristate,
    /// Free-form quoted string.
    String,
    /// Signed decimal integer.
    Int,
    /// Unsigned hexadecimal integer.
    Hex,
}

impl ValueKind {
    /// Value taken by a visible symbol that has no active default.
    pub fn zero(self) -> Value {
        match self {
            ValueKind::Bool | ValueKind::Tristate => Value::Tristate(Tristate::Off),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Int => Value::Int(0),
            ValueKind::Hex => Value::Hex(0),
        }
    }

    /// Whether values of this kind live in tristate logic.
    pub fn is_tristate_like(self) -> bool {
        matches!(self, ValueKind::Bool | ValueKind::Tristate)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Tristate => "tristate",
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Hex => "hex",
        };
        f.write_str(name)
    }
}

/// A concrete symbol value.
///
/// Values read from fragments start out loosely typed (`y`/`m`/`n` or a raw
/// string) and are narrowed to the symbol's [`ValueKind`] by [`Value::coerce`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Bool and tristate values.
    Tristate(Tristate),
    /// String values, also raw literals before coercion.
    String(String),
    /// Decimal integers.
    Int(i64),
    /// Hexadecimal integers.
    Hex(u64),
}

impl Value {
    /// Shorthand for `Value::Tristate(Tristate::On)`.
    pub const Y: Value = Value::Tristate(Tristate::On);
    /// Shorthand for `Value::Tristate(Tristate::Module)`.
    pub const M: Value = Value::Tristate(Tristate::Module);
    /// Shorthand for `Value::Tristate(Tristate::Off)`.
    pub const N: Value = Value::Tristate(Tristate::Off);

    /// Build a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Interpret as a tristate, accepting `"y"`/`"m"`/`"n"` strings.
    pub fn as_tristate(&self) -> Option<Tristate> {
        match self {
            Value::Tristate(t) => Some(*t),
            Value::String(s) => Tristate::from_literal(s),
            _ => None,
        }
    }

    /// Interpret as a number, accepting decimal or `0x` strings.
    pub fn as_number(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i as i128),
            Value::Hex(h) => Some(*h as i128),
            Value::String(s) => {
                let s = s.trim();
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => i128::from_str_radix(hex, 16).ok(),
                    None => s.parse().ok(),
                }
            }
            Value::Tristate(_) => None,
        }
    }

    /// Unquoted textual form, used for string comparisons.
    pub fn text(&self) -> String {
        match self {
            Value::Tristate(t) => t.as_str().to_string(),
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Hex(h) => format!("{h:#x}"),
        }
    }

    /// Narrow this value to `kind`, or `None` on a type mismatch.
    pub fn coerce(&self, kind: ValueKind) -> Option<Value> {
        match kind {
            ValueKind::Bool => self.as_tristate().map(|t| {
                Value::Tristate(if t == Tristate::Off {
                    Tristate::Off
                } else {
                    Tristate::On
                })
            }),
            ValueKind::Tristate => self.as_tristate().map(Value::Tristate),
            ValueKind::String => Some(Value::String(self.text())),
            ValueKind::Int => match self {
                Value::Int(i) => Some(Value::Int(*i)),
                Value::String(s) => s.trim().parse().ok().map(Value::Int),
                _ => None,
            },
            ValueKind::Hex => match self {
                Value::Hex(h) => Some(Value::Hex(*h)),
                Value::String(s) => {
                    let s = s.trim();
                    let digits = s
                        .strip_prefix("0x")
                        .or_else(|| s.strip_prefix("0X"))
                        .unwrap_or(s);
                    u64::from_str_radix(digits, 16).ok().map(Value::Hex)
                }
                _ => None,
            },
        }
    }
}

impl From<Tristate> for Value {
    fn from(t: Tristate) -> Self {
        Value::Tristate(t)
    }
}

/// `.config` value syntax.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Tristate(t) => write!(f, "{t}"),
            Value::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Value::Int(i) => write!(f, "{i}"),
            Value::Hex(h) => write!(f, "{h:#x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tristate_logic() {
        assert!(Tristate::Off < Tristate::Module);
        assert!(Tristate::Module < Tristate::On);
        assert_eq!(!Tristate::On, Tristate::Off);
        assert_eq!(!Tristate::Module, Tristate::Module);
        assert_eq!(Tristate::On.min(Tristate::Module), Tristate::Module);
    }

    #[test]
    fn test_coerce_bool_promotes_module() {
        assert_eq!(Value::M.coerce(ValueKind::Bool), Some(Value::Y));
        assert_eq!(Value::M.coerce(ValueKind::Tristate), Some(Value::M));
        assert_eq!(Value::string("n").coerce(ValueKind::Bool), Some(Value::N));
        assert_eq!(Value::string("maybe").coerce(ValueKind::Bool), None);
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(Value::string("42").coerce(ValueKind::Int), Some(Value::Int(42)));
        assert_eq!(Value::string("-7").coerce(ValueKind::Int), Some(Value::Int(-7)));
        assert_eq!(Value::string("0x1f").coerce(ValueKind::Hex), Some(Value::Hex(0x1f)));
        assert_eq!(Value::string("1000").coerce(ValueKind::Hex), Some(Value::Hex(0x1000)));
        assert_eq!(Value::Y.coerce(ValueKind::Int), None);
        assert_eq!(Value::Int(3).coerce(ValueKind::Hex), None);
        assert_eq!(Value::Int(3).coerce(ValueKind::String), Some(Value::string("3")));
    }

    #[test]
    fn test_display_config_syntax() {
        assert_eq!(Value::Y.to_string(), "y");
        assert_eq!(Value::Hex(4096).to_string(), "0x1000");
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(
            Value::string(r#"say "hi" \o/"#).to_string(),
            r#""say \"hi\" \\o/""#
        );
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::string("0x10").as_number(), Some(16));
        assert_eq!(Value::Hex(16).as_number(), Some(16));
        assert_eq!(Value::Y.as_number(), None);
    }
}

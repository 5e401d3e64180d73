//! Fatal errors and non-fatal diagnostics.

use std::fmt;

use ktree::{TreeError, Value, ValueKind};
use thiserror::Error;

/// Fatal errors that abort a command.
#[derive(Error, Debug)]
pub enum Error {
    /// The tree could not be loaded.
    #[error(transparent)]
    TreeLoad(#[from] TreeError),

    /// The tree is inconsistent and cannot be resolved.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The requested profile is not defined.
    #[error("unknown profile `{0}`")]
    UnknownProfile(String),

    /// A profile includes a group that is not defined.
    #[error("profile `{profile}` includes unknown group `{include}`")]
    UnknownInclude { profile: String, include: String },

    /// The profile set failed validation.
    #[error("invalid profile definitions:\n  {}", .0.join("\n  "))]
    InvalidProfiles(Vec<String>),

    /// Unknown symbols were assigned while unknown symbols are fatal.
    #[error("unknown symbols: {}", .0.join(", "))]
    UnknownSymbols(Vec<String>),
}

/// Inconsistencies in the tree found during resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A visible choice has no selection and its default is hidden.
    #[error("choice `{choice}` is visible but its default `{default}` is not")]
    ChoiceDefaultHidden { choice: String, default: String },

    /// A symbol's value depends on itself.
    #[error("dependency cycle through `{0}`")]
    DependencyCycle(String),
}

/// Why an assignment had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No such symbol in the tree.
    Unknown,
    /// The symbol's dependencies are not met.
    Invisible,
    /// The value does not fit the symbol's kind.
    Mismatch { kind: ValueKind, value: Value },
    /// Another member of the same choice won.
    Overridden { by: String },
}

/// An assignment excluded from the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// Assigned symbol.
    pub symbol: String,
    /// Why it was excluded.
    pub reason: UnresolvedReason,
}

impl Unresolved {
    pub(crate) fn new(symbol: impl Into<String>, reason: UnresolvedReason) -> Self {
        Self {
            symbol: symbol.into(),
            reason,
        }
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            UnresolvedReason::Unknown => write!(f, "{}: unknown symbol", self.symbol),
            UnresolvedReason::Invisible => {
                write!(f, "{}: dependencies not met, assignment ignored", self.symbol)
            }
            UnresolvedReason::Mismatch { kind, value } => {
                write!(f, "{}: `{value}` is not a valid {kind}", self.symbol)
            }
            UnresolvedReason::Overridden { by } => {
                write!(f, "{}: overridden by choice member {by}", self.symbol)
            }
        }
    }
}

/// A problem reported alongside otherwise successful output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An assignment was excluded.
    Unresolved(Unresolved),
    /// A leaf section holds more symbols than the requested bound.
    SizeBoundUnsatisfiable {
        fragment: String,
        count: usize,
        bound: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Unresolved(u) => u.fmt(f),
            Diagnostic::SizeBoundUnsatisfiable {
                fragment,
                count,
                bound,
            } => write!(
                f,
                "fragment `{fragment}` holds {count} symbols, more than {bound}, and cannot be split further"
            ),
        }
    }
}

impl From<Unresolved> for Diagnostic {
    fn from(u: Unresolved) -> Self {
        Diagnostic::Unresolved(u)
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

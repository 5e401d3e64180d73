use std::path::PathBuf;

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised while loading or validating a symbol tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The kernel source directory does not exist.
    #[error("kernel source not found: {}", .0.display())]
    MissingKernelSource(PathBuf),

    /// No tree snapshot exists for the requested architecture.
    #[error("unsupported architecture `{arch}`: no tree snapshot under {}", .dir.display())]
    UnsupportedArch { arch: String, dir: PathBuf },

    /// The snapshot was produced for a different architecture.
    #[error("tree snapshot {} is for `{found}`, expected `{expected}`", .path.display())]
    ArchMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The snapshot file extension is neither `json` nor `toml`.
    #[error("unsupported tree snapshot extension: {0:?}")]
    UnsupportedFormat(String),

    /// Reading the snapshot failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON.
    #[error("malformed JSON tree snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot is not valid TOML.
    #[error("malformed TOML tree snapshot: {0}")]
    Toml(#[from] toml::de::Error),

    /// Two declarations share a symbol name.
    #[error("symbol `{0}` is declared more than once")]
    DuplicateSymbol(String),

    /// A symbol or menu has an empty name.
    #[error("empty {0} name")]
    EmptyName(&'static str),

    /// A choice default names a symbol that is not one of its members.
    #[error("choice `{choice}` defaults to `{default}`, which is not a member")]
    UnknownChoiceDefault { choice: String, default: String },

    /// A choice member is not a bool.
    #[error("choice member `{symbol}` must be bool, found {kind}")]
    ChoiceMemberKind { symbol: String, kind: ValueKind },

    /// A literal default cannot be represented in the symbol's kind.
    #[error("default `{literal}` of `{symbol}` is not a valid {kind}")]
    InvalidDefault {
        symbol: String,
        kind: ValueKind,
        literal: String,
    },
}

//! # ktree
//!
//! Kconfig-style symbol tree model.
//!
//! `ktree` holds the parsed configuration tree of one architecture: symbols
//! with their types, dependencies and defaults, the menu hierarchy they are
//! declared in, and the choice groups that make some of them mutually
//! exclusive.
//!
//! ## Features
//!
//! - Typed dependency expressions with a tristate interpreter
//! - Arena-backed tree with declaration-ordered symbol ids
//! - Serializable tree snapshots in JSON or TOML, with a JSON schema
//! - A [`TreeProvider`] reading per-architecture snapshots from a kernel source
//!
//! ## Example
//!
//! ```rust
//! use ktree::{ConfigSpec, Expr, MenuSpec, TreeSnapshot, ValueKind};
//!
//! let tree = TreeSnapshot::new("x86")
//!     .entry(ConfigSpec::new("NET", ValueKind::Bool).default(Expr::y()))
//!     .entry(
//!         MenuSpec::new("net")
//!             .depends_on(Expr::sym("NET"))
//!             .entry(ConfigSpec::new("INET", ValueKind::Bool)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let inet = tree.get("INET").unwrap();
//! assert_eq!(tree.section(inet.section).path, "net");
//! ```
//!
//! ## Modules
//!
//! - [`value`] - Tristate logic, symbol kinds and values
//! - [`expr`] - Dependency expressions
//! - [`snapshot`] - Serialized tree format
//! - [`tree`] - The loaded tree
//! - [`provider`] - Loading trees from a kernel source

#[macro_use]
extern crate log;

/// Error types.
pub mod error;

/// Dependency expressions and their evaluation.
pub mod expr;

/// Loading trees from a kernel source directory.
pub mod provider;

/// Serialized tree snapshots.
pub mod snapshot;

/// Arena-backed symbol tree.
pub mod tree;

/// Tristate logic, symbol kinds and values.
pub mod value;

pub use error::TreeError;
pub use expr::{CompareOp, Env, Expr};
pub use provider::{SNAPSHOT_DIR, SnapshotProvider, TreeProvider, read_snapshot};
pub use snapshot::{ChoiceSpec, ConfigSpec, DefaultValue, Entry, MenuSpec, TreeSnapshot};
pub use tree::{ChoiceGroup, ChoiceId, Section, SectionId, Symbol, SymbolId, Tree};
pub use value::{Tristate, Value, ValueKind};

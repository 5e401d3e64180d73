//! # kconftool
//!
//! Merge, minimize and split Kconfig configuration fragments.
//!
//! `kconftool` works on the symbol tree of one architecture (see [`ktree`])
//! and flat `.config` style fragments. It can merge several fragments into a
//! full or minimal configuration, split a configuration back into
//! per-section fragments, and assemble a configuration from a named profile.
//!
//! ## Features
//!
//! - **Resolution**: dependency-aware evaluation with choice exclusivity
//! - **Minimal configurations**: smallest declaration-order assignment list
//!   reproducing a target
//! - **Splitting**: by requested section paths or by a maximum fragment size
//! - **Profiles**: reusable fragment sets in a `profiles.toml` file
//!
//! ## Example
//!
//! ```rust
//! use kconftool::{assignment::Assignment, minimize::minimize, resolve::resolve};
//! use ktree::{ConfigSpec, Expr, TreeSnapshot, Value, ValueKind};
//!
//! let tree = TreeSnapshot::new("x86")
//!     .entry(ConfigSpec::new("A", ValueKind::Bool).default(Expr::y()))
//!     .entry(ConfigSpec::new("B", ValueKind::Bool).depends_on(Expr::sym("A")))
//!     .build()
//!     .unwrap();
//!
//! let resolved = resolve(&tree, &[Assignment::new("B", Value::Y)]).unwrap();
//! assert_eq!(resolved.config.get("A"), Some(&Value::Y));
//!
//! let minimal = minimize(&tree, &resolved.config);
//! assert_eq!(minimal.assignments, vec![Assignment::new("B", Value::Y)]);
//! ```
//!
//! ## Modules
//!
//! - [`resolve`] - Value resolution
//! - [`minimize`] - Minimal-delta computation
//! - [`partition`] - Section partitioning
//! - [`profile`] - Profile definitions
//! - [`fragment`] - The `.config` text format
//! - [`ctx`] - Command context
//! - [`cmd`] - Command pipelines

/// Assignments, fragments and resolved configurations.
pub mod assignment;

/// Command pipelines for `merge`, `split` and `assemble`.
pub mod cmd;

/// Command context threaded through every pipeline.
pub mod ctx;

/// Error and diagnostic types.
pub mod error;

/// The flat `.config` text format.
pub mod fragment;

/// Minimal-delta computation.
pub mod minimize;

/// Section partitioning.
pub mod partition;

/// Profile definitions and expansion.
pub mod profile;

/// Value resolution.
pub mod resolve;

#[macro_use]
extern crate log;

pub use ktree;

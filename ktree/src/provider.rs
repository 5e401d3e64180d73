//! Loading trees from a kernel source directory.
//!
//! The provider never parses Kconfig files itself. A front end dumps the
//! evaluated tree for each architecture into
//! `<kernel_source>/.kconfig-tree/<arch>.json` (or `.toml`), and the
//! [`SnapshotProvider`] reads it back.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::TreeError, snapshot::TreeSnapshot, tree::Tree};

/// Directory under the kernel source holding per-architecture snapshots.
pub const SNAPSHOT_DIR: &str = ".kconfig-tree";

const EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Source of symbol trees.
pub trait TreeProvider {
    /// Load the tree of `arch` from `kernel_source`.
    fn load(&self, kernel_source: &Path, arch: &str) -> Result<Tree, TreeError>;
}

/// Reads trees from snapshot files inside the kernel source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotProvider;

impl SnapshotProvider {
    /// Locate the snapshot of `arch`, trying each supported extension.
    pub fn snapshot_path(kernel_source: &Path, arch: &str) -> Result<PathBuf, TreeError> {
        if !kernel_source.is_dir() {
            return Err(TreeError::MissingKernelSource(kernel_source.to_path_buf()));
        }
        let dir = kernel_source.join(SNAPSHOT_DIR);
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{arch}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| TreeError::UnsupportedArch {
                arch: arch.to_string(),
                dir,
            })
    }
}

impl TreeProvider for SnapshotProvider {
    fn load(&self, kernel_source: &Path, arch: &str) -> Result<Tree, TreeError> {
        let path = Self::snapshot_path(kernel_source, arch)?;
        debug!("loading tree snapshot {}", path.display());

        let snapshot = read_snapshot(&path)?;
        if snapshot.arch != arch {
            return Err(TreeError::ArchMismatch {
                path,
                expected: arch.to_string(),
                found: snapshot.arch,
            });
        }

        let tree = snapshot.build()?;
        info!(
            "loaded {} symbols, {} choice groups for {arch}",
            tree.len(),
            tree.choice_groups().len()
        );
        Ok(tree)
    }
}

/// Read a snapshot file, picking the format from its extension.
pub fn read_snapshot(path: &Path) -> Result<TreeSnapshot, TreeError> {
    let content = fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" => TreeSnapshot::from_json_str(&content),
        "toml" => TreeSnapshot::from_toml_str(&content),
        ext => Err(TreeError::UnsupportedFormat(ext.to_string())),
    }
}

impl TreeSnapshot {
    /// Parse a JSON snapshot.
    pub fn from_json_str(s: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse a TOML snapshot.
    pub fn from_toml_str(s: &str) -> Result<Self, TreeError> {
        Ok(toml::from_str(s)?)
    }
}

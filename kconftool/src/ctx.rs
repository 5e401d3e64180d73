//! Command context.
//!
//! [`AppContext`] carries the kernel source, architecture and strictness
//! flags every command needs, so that nothing is read from global state.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use ktree::{SnapshotProvider, Tree, TreeProvider};
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    assignment::Assignment,
    error::{Diagnostic, Error, Result, UnresolvedReason},
    fragment,
};

/// Output path meaning standard output.
pub const STDOUT: &str = "-";

/// Inputs shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Root of the kernel source tree.
    pub kernel_source: PathBuf,
    /// Target architecture.
    pub arch: String,
    /// Treat assignments to unknown symbols as fatal.
    pub fail_on_unknown: bool,
}

impl AppContext {
    /// Context for `arch` in `kernel_source`.
    pub fn new(kernel_source: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        Self {
            kernel_source: kernel_source.into(),
            arch: arch.into(),
            fail_on_unknown: false,
        }
    }

    /// Set whether unknown symbols abort the command.
    pub fn fail_on_unknown(mut self, fail: bool) -> Self {
        self.fail_on_unknown = fail;
        self
    }

    /// Load the tree with the default snapshot provider.
    pub fn load_tree(&self) -> Result<Tree> {
        self.load_tree_with(&SnapshotProvider)
    }

    /// Load the tree with `provider`.
    pub fn load_tree_with(&self, provider: &impl TreeProvider) -> Result<Tree> {
        Ok(provider.load(&self.kernel_source, &self.arch)?)
    }

    /// Log every diagnostic, then fail if unknown symbols are fatal.
    pub fn check_diagnostics(&self, diagnostics: &[Diagnostic]) -> Result<()> {
        for diagnostic in diagnostics {
            warn!("{diagnostic}");
        }
        if !self.fail_on_unknown {
            return Ok(());
        }
        let unknown: Vec<String> = diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::Unresolved(u) if u.reason == UnresolvedReason::Unknown => {
                    Some(u.symbol.clone())
                }
                _ => None,
            })
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::UnknownSymbols(unknown))
        }
    }

    /// Read and parse a fragment file.
    pub async fn read_fragment(&self, path: &Path) -> anyhow::Result<Vec<Assignment>> {
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let assignments = fragment::parse(&text);
        debug!("{}: {} assignments", path.display(), assignments.len());
        Ok(assignments)
    }

    /// Read several fragments and concatenate them in order.
    pub async fn read_fragments(&self, paths: &[PathBuf]) -> anyhow::Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for path in paths {
            assignments.extend(self.read_fragment(path).await?);
        }
        Ok(assignments)
    }

    /// Write `content` to `output`, or to stdout when `output` is `-`.
    pub async fn write_output(&self, output: &Path, content: &str) -> anyhow::Result<()> {
        if output == Path::new(STDOUT) {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(content.as_bytes()).await?;
            stdout.flush().await?;
            return Ok(());
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(output, content)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("{} {}", "wrote".green(), output.display());
        Ok(())
    }
}

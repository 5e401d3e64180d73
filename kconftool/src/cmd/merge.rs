use std::path::{Path, PathBuf};

use anyhow::Context;
use ktree::Tree;

use crate::{
    assignment::Assignment,
    cmd::Stats,
    ctx::{AppContext, STDOUT},
    error::{Diagnostic, Result},
    fragment,
    minimize::minimize,
    resolve::resolve,
};

/// Result of merging assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// Output assignments in declaration order.
    pub assignments: Vec<Assignment>,
    /// Assignments that had no effect.
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve `assignments` and return the full, or minimal, configuration.
pub fn merge_assignments(tree: &Tree, assignments: &[Assignment], minimal: bool) -> Result<Merged> {
    let resolution = resolve(tree, assignments)?;
    let mut diagnostics: Vec<Diagnostic> =
        resolution.unresolved.into_iter().map(Diagnostic::from).collect();

    let assignments = if minimal {
        let minimized = minimize(tree, &resolution.config);
        diagnostics.extend(minimized.skipped.into_iter().map(Diagnostic::from));
        minimized.assignments
    } else {
        resolution.config.to_assignments()
    };
    Ok(Merged {
        assignments,
        diagnostics,
    })
}

impl AppContext {
    /// Merge `sources` in order and write the result to `output`.
    pub async fn merge(
        &self,
        sources: &[PathBuf],
        minimal: bool,
        output: &Path,
    ) -> anyhow::Result<Stats> {
        let tree = self
            .load_tree()
            .with_context(|| format!("cannot load the {} tree", self.arch))?;
        let assignments = self.read_fragments(sources).await?;
        info!(
            "merging {} assignments from {} fragments",
            assignments.len(),
            sources.len()
        );

        let merged = merge_assignments(&tree, &assignments, minimal)?;
        self.check_diagnostics(&merged.diagnostics)?;

        self.write_output(output, &fragment::render(&merged.assignments))
            .await?;
        let files = if output == Path::new(STDOUT) {
            Vec::new()
        } else {
            vec![output.to_path_buf()]
        };
        Ok(Stats {
            nb_symbols: merged.assignments.len(),
            files,
        })
    }
}

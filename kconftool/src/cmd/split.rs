use std::path::{Path, PathBuf};

use anyhow::Context;
use ktree::Tree;
use tokio::fs;

use crate::{
    assignment::{Assignment, Fragment},
    cmd::Stats,
    ctx::AppContext,
    error::{Diagnostic, Result},
    fragment,
    minimize::minimize,
    partition::{Partition, PartitionMode, partition},
    resolve::resolve,
};

/// Default output file prefix.
pub const DEFAULT_PREFIX: &str = "defconfig";

/// Minimize `assignments` and partition the result.
///
/// The configuration is resolved first, so assignments without effect are
/// reported rather than carried into the fragments.
pub fn split_assignments(
    tree: &Tree,
    assignments: &[Assignment],
    mode: &PartitionMode,
) -> Result<Partition> {
    let resolution = resolve(tree, assignments)?;
    let mut diagnostics: Vec<Diagnostic> =
        resolution.unresolved.into_iter().map(Diagnostic::from).collect();

    let minimized = minimize(tree, &resolution.config);
    diagnostics.extend(minimized.skipped.into_iter().map(Diagnostic::from));

    let mut part = partition(tree, &minimized.assignments, mode);
    diagnostics.append(&mut part.diagnostics);
    part.diagnostics = diagnostics;
    Ok(part)
}

/// File name of a fragment: `<prefix>` for the remainder, else
/// `<prefix>.<fragment name>`.
pub fn file_name(prefix: &str, fragment: &Fragment) -> String {
    if fragment.is_remainder() {
        prefix.to_string()
    } else {
        format!("{prefix}.{}", fragment.name)
    }
}

/// Read a categories file: one section path per line.
///
/// Blank lines and `#` comments are ignored.
pub async fn read_categories(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read categories from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

impl AppContext {
    /// Split the configuration in `source` into files under `destdir`.
    pub async fn split(
        &self,
        source: &Path,
        mode: &PartitionMode,
        destdir: &Path,
        prefix: &str,
    ) -> anyhow::Result<Stats> {
        let tree = self
            .load_tree()
            .with_context(|| format!("cannot load the {} tree", self.arch))?;
        let assignments = self.read_fragment(source).await?;

        let part = split_assignments(&tree, &assignments, mode)?;
        self.check_diagnostics(&part.diagnostics)?;

        fs::create_dir_all(destdir)
            .await
            .with_context(|| format!("failed to create {}", destdir.display()))?;
        let mut stats = Stats::default();
        for fragment in &part.fragments {
            let path: PathBuf = destdir.join(file_name(prefix, fragment));
            debug!(
                "{}: {} symbols from `{}`",
                path.display(),
                fragment.len(),
                fragment.label
            );
            self.write_output(&path, &fragment::render(&fragment.assignments))
                .await?;
            stats.nb_symbols += fragment.len();
            stats.files.push(path);
        }
        Ok(stats)
    }
}

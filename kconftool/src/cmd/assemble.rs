use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;

use crate::{
    cmd::Stats,
    ctx::AppContext,
    profile::{PROFILES_FILENAME, ProfileSet, ResolvedProfile, resolve_profile},
};

/// Parameters of an `assemble` run.
#[derive(Debug, Clone)]
pub struct AssembleRequest {
    /// Directory holding `profiles.toml` and the fragments.
    pub root: PathBuf,
    /// Profile to build.
    pub profile: String,
    /// Extra include groups applied after the profile's own.
    pub includes: Vec<String>,
    /// Emit a minimal configuration.
    pub minimal: bool,
    /// Output path, `-` for stdout.
    pub output: PathBuf,
}

/// Load and validate `<root>/profiles.toml`.
pub async fn load_profiles(root: &Path) -> anyhow::Result<ProfileSet> {
    let path = root.join(PROFILES_FILENAME);
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    ProfileSet::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
}

/// Expand the requested profile.
pub async fn load_profile(request: &AssembleRequest) -> anyhow::Result<ResolvedProfile> {
    let set = load_profiles(&request.root).await?;
    let profile = resolve_profile(&set, &request.profile, &request.includes)?;
    info!(
        "profile {} for {}: {} fragments",
        profile.name,
        profile.arch,
        profile.files.len()
    );
    Ok(profile)
}

/// Build the configuration of a profile.
///
/// The profile decides the architecture, so the context is created here from
/// the kernel source and strictness flag.
pub async fn assemble(
    kernel_source: &Path,
    fail_on_unknown: bool,
    request: &AssembleRequest,
) -> anyhow::Result<Stats> {
    let profile = load_profile(request).await?;
    let ctx = AppContext::new(kernel_source, &profile.arch).fail_on_unknown(fail_on_unknown);
    ctx.merge(&profile.paths(&request.root), request.minimal, &request.output)
        .await
}

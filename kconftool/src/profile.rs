//! Profile definitions and their expansion.
//!
//! Profiles are stored in a `profiles.toml` file at the root of a fragment
//! directory.
//!
//! # File Format
//!
//! ```toml
//! [include.core]
//! files = ["defconfig.crypto", "defconfig.fs"]
//!
//! [include.server]
//! files = ["defconfig.net", "defconfig.net_netfilter"]
//!
//! [profile.example]
//! arch = "x86"
//! include = ["core", "server"]
//! extras = ["defconfig.example"]
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the profile file inside a profiles root.
pub const PROFILES_FILENAME: &str = "profiles.toml";

/// All profiles and include groups of a profiles file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProfileSet {
    /// Profiles by name.
    #[serde(default)]
    pub profile: BTreeMap<String, ProfileDef>,
    /// Include groups by name.
    #[serde(default)]
    pub include: BTreeMap<String, IncludeDef>,
}

/// A `[profile.<name>]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProfileDef {
    /// Target architecture.
    pub arch: Option<String>,
    /// Include groups, expanded in order.
    #[serde(default)]
    pub include: Vec<String>,
    /// Extra fragment files, applied after every include group.
    #[serde(default)]
    pub extras: Vec<String>,
}

/// An `[include.<name>]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IncludeDef {
    /// Fragment files, relative to the profiles root.
    pub files: Option<Vec<String>>,
}

/// A profile expanded into an architecture and an ordered fragment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Profile name.
    pub name: String,
    /// Target architecture.
    pub arch: String,
    /// Fragment files in application order, duplicates kept.
    pub files: Vec<String>,
}

impl ResolvedProfile {
    /// Fragment paths joined onto the profiles root.
    pub fn paths(&self, root: &Path) -> Vec<PathBuf> {
        self.files.iter().map(|file| root.join(file)).collect()
    }
}

impl ProfileSet {
    /// Parse and validate a profiles file.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let set: ProfileSet = toml::from_str(s)?;
        set.validate()?;
        Ok(set)
    }

    /// Check every profile and include group, collecting all problems.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        for (name, profile) in &self.profile {
            if profile.arch.as_deref().is_none_or(str::is_empty) {
                errors.push(format!("missing arch for profile {name}"));
            }
            if profile.include.is_empty() && profile.extras.is_empty() {
                errors.push(format!("missing 'include' or 'extras' for profile {name}"));
            }
            for include in &profile.include {
                if !self.include.contains_key(include) {
                    errors.push(format!(
                        "reference to missing group {include} in profile {name}"
                    ));
                }
            }
        }
        for (name, group) in &self.include {
            if group.files.is_none() {
                errors.push(format!("missing 'files' for include group {name}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidProfiles(errors))
        }
    }
}

/// Expand profile `name` into its architecture and fragment list.
///
/// Fragments of the profile's include groups come first, then those of
/// `extra_includes`, then the profile's extras.
pub fn resolve_profile(
    set: &ProfileSet,
    name: &str,
    extra_includes: &[String],
) -> Result<ResolvedProfile> {
    let profile = set
        .profile
        .get(name)
        .ok_or_else(|| Error::UnknownProfile(name.to_string()))?;

    let mut files = Vec::new();
    for include in profile.include.iter().chain(extra_includes) {
        let group = set.include.get(include).ok_or_else(|| Error::UnknownInclude {
            profile: name.to_string(),
            include: include.clone(),
        })?;
        files.extend(group.files.iter().flatten().cloned());
    }
    files.extend(profile.extras.iter().cloned());

    Ok(ResolvedProfile {
        name: name.to_string(),
        arch: profile.arch.clone().unwrap_or_default(),
        files,
    })
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use crate::plan::Plan;
use crate::types::IssueDef;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest compiled into the binary, used when no `--manifest` is given
pub const BUILTIN_MANIFEST: &str = include_str!("../manifests/eventos.toml");

/// Tracker client used when none is configured
pub const DEFAULT_TRACKER_PROGRAM: &str = "gh";

/// On-disk description of an issue plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Target repository, `OWNER/NAME`
    pub repo: String,
    /// Directory holding the source files, relative to the manifest
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Issue definitions in creation order
    #[serde(default)]
    pub issues: Vec<IssueDef>,
}

impl Manifest {
    /// Parse a manifest from TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse issue manifest")
    }

    /// The built-in plan
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_MANIFEST)
    }

    /// Read a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid manifest {}", path.display()))
    }
}

/// Command line and environment overrides
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Manifest file replacing the built-in plan
    pub manifest: Option<PathBuf>,
    /// Repository replacing the manifest's
    pub repo: Option<String>,
    /// Directory holding the source files
    pub base_dir: Option<PathBuf>,
    /// Tracker client executable
    pub tracker_program: Option<PathBuf>,
}

/// Everything a run needs, fixed before the first tracker call
#[derive(Debug, Clone)]
pub struct Config {
    /// Target repository, `OWNER/NAME`
    pub repo: String,
    /// Directory holding source files and temporary bodies
    pub base_dir: PathBuf,
    /// Tracker client executable
    pub tracker_program: PathBuf,
    /// Validated issue definitions
    pub plan: Plan,
}

/// Build the configuration from the selected manifest and overrides
pub fn load(overrides: &Overrides) -> Result<Config> {
    let (manifest, manifest_dir) = match &overrides.manifest {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (Manifest::from_file(path)?, Some(dir))
        }
        None => (Manifest::builtin()?, None),
    };

    let repo = overrides.repo.clone().unwrap_or(manifest.repo);
    validate_repo(&repo)?;

    let base_dir = match (&overrides.base_dir, manifest.base_dir, manifest_dir) {
        (Some(dir), _, _) => dir.clone(),
        (None, Some(dir), Some(manifest_dir)) => manifest_dir.join(dir),
        (None, Some(dir), None) => dir,
        (None, None, Some(manifest_dir)) => manifest_dir,
        (None, None, None) => {
            std::env::current_dir().context("Failed to determine the current directory")?
        }
    };

    let plan = Plan::new(manifest.issues).context("Invalid issue list")?;

    Ok(Config {
        repo,
        base_dir,
        tracker_program: overrides
            .tracker_program
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACKER_PROGRAM)),
        plan,
    })
}

fn validate_repo(repo: &str) -> Result<()> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.trim().is_empty()) {
        bail!("Invalid repository '{}': expected OWNER/NAME", repo);
    }
    Ok(())
}

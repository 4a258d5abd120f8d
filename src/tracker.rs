// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Issue tracker client - the external `gh` command line tool

use crate::error::{RegistrarError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

static ISSUE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/issues/(\d+)").expect("issue number pattern is valid"));

/// Operations a run needs from the issue tracker
pub trait IssueTracker {
    /// File a new issue and return the client's confirmation output
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be run or reports failure.
    fn create_issue(&mut self, repo: &str, title: &str, body_file: &Path) -> Result<String>;

    /// Replace the body of an existing issue
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be run or reports failure.
    fn edit_issue(&mut self, repo: &str, number: u64, body_file: &Path) -> Result<()>;
}

/// Extract the issue number from a creation response such as
/// `https://github.com/owner/repo/issues/42`.
#[must_use]
pub fn parse_issue_number(output: &str) -> Option<u64> {
    ISSUE_NUMBER
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// [`IssueTracker`] backed by the GitHub CLI.
///
/// Authentication is whatever `gh` is already logged in with.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    /// Use `program` as the `gh` executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, operation: &'static str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);
        debug!("Running {:?}", command);

        let output = command.output().map_err(|source| RegistrarError::TrackerLaunch {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(RegistrarError::TrackerFailed {
                operation,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl IssueTracker for GhCli {
    fn create_issue(&mut self, repo: &str, title: &str, body_file: &Path) -> Result<String> {
        self.run(
            "create",
            [
                OsStr::new("issue"),
                OsStr::new("create"),
                OsStr::new("--repo"),
                OsStr::new(repo),
                OsStr::new("--title"),
                OsStr::new(title),
                OsStr::new("--body-file"),
                body_file.as_os_str(),
            ],
        )
    }

    fn edit_issue(&mut self, repo: &str, number: u64, body_file: &Path) -> Result<()> {
        let number = number.to_string();
        self.run(
            "edit",
            [
                OsStr::new("issue"),
                OsStr::new("edit"),
                OsStr::new(&number),
                OsStr::new("--repo"),
                OsStr::new(repo),
                OsStr::new("--body-file"),
                body_file.as_os_str(),
            ],
        )
        .map(|_| ())
    }
}

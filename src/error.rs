// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the registrar library

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a registration run
#[derive(Error, Debug)]
pub enum RegistrarError {
    /// An issue's source file is missing or not valid UTF-8
    #[error("failed to read source for {key} from {}: {source}", path.display())]
    ReadSource {
        /// Definition key
        key: String,
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The first line of a source file yields no title
    #[error("source for {key} ({}) has an empty first line; refusing to create an untitled issue", path.display())]
    EmptyTitle {
        /// Definition key
        key: String,
        /// Offending file
        path: PathBuf,
    },

    /// The definition list is empty
    #[error("no issues are defined")]
    EmptyPlan,

    /// Two definitions share a key
    #[error("issue key {0} is defined more than once")]
    DuplicateKey(String),

    /// A scoped body file could not be written
    #[error("failed to write temporary body for {key}: {source}")]
    TempFile {
        /// Definition key
        key: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The tracker client could not be started
    #[error("failed to launch tracker client {program}: {source}")]
    TrackerLaunch {
        /// Program that was invoked
        program: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The tracker client exited unsuccessfully
    #[error("tracker client failed to {operation} (exit code {}): {stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    TrackerFailed {
        /// `create` or `edit`
        operation: &'static str,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The creation response carried no `/issues/<number>` reference
    #[error("could not extract an issue number for {key} from tracker output: {output}")]
    UnparseableResponse {
        /// Definition key
        key: String,
        /// Raw tracker output
        output: String,
    },

    /// A definition reached the patch pass without an assigned number
    #[error("issue {0} has no assigned number")]
    UnknownIssue(String),
}

/// Result alias for registrar operations
pub type Result<T> = std::result::Result<T, RegistrarError>;

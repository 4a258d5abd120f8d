// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Issue registrar library - files a planned set of issues and cross-links them
//!
//! A run walks an ordered list of issue definitions twice: the creation pass
//! files every issue through an external tracker client and records the
//! number it was given, the patch pass rewrites every body so that its
//! dependency footer points at those numbers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod commands;
pub mod config;
pub mod error;
pub mod plan;
pub mod registrar;
pub mod tracker;

pub use error::{RegistrarError, Result};

/// Core data types shared by the passes and the commands
pub mod types {
    use serde::{Deserialize, Serialize};

    // =========================================================================
    // Issue Definition
    // =========================================================================

    /// One planned work item, as declared in the manifest
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IssueDef {
        /// Short unique key, e.g. `BE-01`
        pub key: String,
        /// Markdown source file, relative to the base directory
        pub file: String,
        /// Planned start date, shown verbatim in the footer
        pub starts: String,
        /// Keys of the issues this one depends on, in display order
        #[serde(default)]
        pub depends_on: Vec<String>,
    }

    impl IssueDef {
        /// Build a definition from borrowed parts
        #[must_use]
        pub fn new(key: &str, file: &str, starts: &str, depends_on: &[&str]) -> Self {
            Self {
                key: key.into(),
                file: file.into(),
                starts: starts.into(),
                depends_on: depends_on.iter().map(|d| (*d).to_string()).collect(),
            }
        }
    }

    // =========================================================================
    // Run Results
    // =========================================================================

    /// An issue filed during the creation pass
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CreatedIssue {
        /// Definition key
        pub key: String,
        /// Number assigned by the tracker
        pub number: u64,
        /// Confirmation URL printed by the tracker client
        pub url: String,
    }

    /// Summary of a completed run
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RunReport {
        /// Repository the issues were filed in
        pub repo: String,
        /// Created issues, in declaration order
        pub issues: Vec<CreatedIssue>,
    }
}

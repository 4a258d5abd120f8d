// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Validated, ordered list of issue definitions

use crate::error::{RegistrarError, Result};
use crate::types::IssueDef;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A dependency that will not render as a number in every pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyWarning {
    /// Depends on an issue declared later; its creation body shows the raw key
    Forward {
        /// Dependent issue
        key: String,
        /// Dependency declared after it
        dependency: String,
    },
    /// Depends on itself
    SelfReference {
        /// Offending issue
        key: String,
    },
    /// Depends on a key that no definition declares; never resolved
    Unknown {
        /// Dependent issue
        key: String,
        /// Undeclared dependency
        dependency: String,
    },
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward { key, dependency } => write!(
                f,
                "{key} depends on {dependency}, which is declared later; \
                 its initial body will show the raw key until the patch pass"
            ),
            Self::SelfReference { key } => write!(f, "{key} depends on itself"),
            Self::Unknown { key, dependency } => write!(
                f,
                "{key} depends on {dependency}, which is not defined; it will stay unresolved"
            ),
        }
    }
}

/// Ordered issue definitions with unique keys
#[derive(Debug, Clone)]
pub struct Plan {
    issues: Vec<IssueDef>,
}

impl Plan {
    /// Validate and wrap a definition list.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a repeated key.
    pub fn new(issues: Vec<IssueDef>) -> Result<Self> {
        if issues.is_empty() {
            return Err(RegistrarError::EmptyPlan);
        }

        let mut seen = HashSet::new();
        for issue in &issues {
            if !seen.insert(issue.key.as_str()) {
                return Err(RegistrarError::DuplicateKey(issue.key.clone()));
            }
        }

        Ok(Self { issues })
    }

    /// Definitions in declaration order
    #[must_use]
    pub fn issues(&self) -> &[IssueDef] {
        &self.issues
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false for a constructed plan
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Dependencies that resolve late or never, in declaration order
    #[must_use]
    pub fn dependency_warnings(&self) -> Vec<DependencyWarning> {
        let position: HashMap<&str, usize> = self
            .issues
            .iter()
            .enumerate()
            .map(|(i, issue)| (issue.key.as_str(), i))
            .collect();

        let mut warnings = Vec::new();
        for (index, issue) in self.issues.iter().enumerate() {
            for dep in &issue.depends_on {
                let warning = match position.get(dep.as_str()) {
                    None => Some(DependencyWarning::Unknown {
                        key: issue.key.clone(),
                        dependency: dep.clone(),
                    }),
                    Some(&at) if at == index => Some(DependencyWarning::SelfReference {
                        key: issue.key.clone(),
                    }),
                    Some(&at) if at > index => Some(DependencyWarning::Forward {
                        key: issue.key.clone(),
                        dependency: dep.clone(),
                    }),
                    Some(_) => None,
                };
                warnings.extend(warning);
            }
        }
        warnings
    }
}

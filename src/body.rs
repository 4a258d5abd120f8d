// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Issue body composition: titles and the dependency footer

use crate::types::IssueDef;
use std::collections::HashMap;

/// Separator between the original body and the footer
pub const FOOTER_DELIMITER: &str = "---";

/// Heading of the footer section
pub const FOOTER_HEADING: &str = "## Dependências e Precedência";

/// Rendered in place of an empty dependency list
pub const NO_DEPENDENCIES: &str = "—";

/// Derive an issue title from the first line of its markdown source.
///
/// Leading `#` markers and surrounding whitespace are removed. Returns `None`
/// when nothing is left, so callers can refuse to file an untitled issue.
#[must_use]
pub fn title_from(markdown: &str) -> Option<String> {
    let first = markdown.lines().next()?;
    let title = first.trim().trim_start_matches('#').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Render the dependency list of `issue`.
///
/// Keys present in `numbers` become `#<number>`, the rest stay as raw keys.
#[must_use]
pub fn dependency_line(issue: &IssueDef, numbers: &HashMap<String, u64>) -> String {
    if issue.depends_on.is_empty() {
        return NO_DEPENDENCIES.to_string();
    }

    issue
        .depends_on
        .iter()
        .map(|dep| match numbers.get(dep) {
            Some(number) => format!("#{number}"),
            None => dep.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append the scheduling footer to `raw_body`.
///
/// Must be given the original source text: feeding it an already patched body
/// appends a second footer.
#[must_use]
pub fn body_with_plan(raw_body: &str, numbers: &HashMap<String, u64>, issue: &IssueDef) -> String {
    format!(
        "{}\n\n{FOOTER_DELIMITER}\n{FOOTER_HEADING}\n- Marco de início planejado: {}\n- Depende de: {}\n\n",
        raw_body.trim_end(),
        issue.starts,
        dependency_line(issue, numbers),
    )
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check command - validates the plan and its sources without filing anything

use crate::body::dependency_line;
use crate::config::Config;
use crate::registrar::SourceCache;
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Run the check command
pub fn run(config: &Config) -> Result<()> {
    let sources = SourceCache::load(&config.plan, &config.base_dir)
        .with_context(|| format!("Failed to load issue sources from {}", config.base_dir.display()))?;

    println!("Repository: {}", config.repo);
    println!("Sources:    {}", config.base_dir.display());
    println!();

    let no_numbers = HashMap::new();
    for issue in config.plan.issues() {
        let title = sources.get(&issue.key).map_or("", |s| s.title.as_str());
        println!(
            "  {:<8} {:<12} {:<24} {}",
            issue.key,
            issue.starts,
            dependency_line(issue, &no_numbers),
            title
        );
    }

    let warnings = config.plan.dependency_warnings();
    if !warnings.is_empty() {
        println!();
        for warning in &warnings {
            eprintln!("Warning: {warning}");
        }
    }

    println!();
    println!(
        "{} issues ready, {} dependency warning(s)",
        config.plan.len(),
        warnings.len()
    );

    Ok(())
}

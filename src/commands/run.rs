// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Run command - files every planned issue, then cross-links their bodies

use crate::body::body_with_plan;
use crate::config::Config;
use crate::plan::Plan;
use crate::registrar::{Registrar, SourceCache};
use crate::tracker::{GhCli, IssueTracker};
use crate::types::CreatedIssue;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Printed once both passes have finished
pub const COMPLETION_MESSAGE: &str = "Registro concluído com dependências atualizadas.";

/// Arguments for the run command
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Render the creation-pass bodies without contacting the tracker
    pub dry_run: bool,
    /// Print the report as JSON
    pub json: bool,
    /// Style progress output
    pub color: bool,
}

/// Body a dry run would submit for one issue
#[derive(Debug, Serialize)]
struct Preview<'a> {
    key: &'a str,
    title: &'a str,
    body: String,
}

/// Run against the configured `gh` executable
pub fn run(config: &Config, args: &RunArgs) -> Result<()> {
    let mut tracker = GhCli::new(&config.tracker_program);
    run_with(config, args, &mut tracker)
}

/// Run against any tracker client
pub fn run_with<T: IssueTracker>(config: &Config, args: &RunArgs, tracker: &mut T) -> Result<()> {
    log_dependency_warnings(&config.plan);

    let sources = SourceCache::load(&config.plan, &config.base_dir)
        .with_context(|| format!("Failed to load issue sources from {}", config.base_dir.display()))?;

    if args.dry_run {
        return preview(config, &sources, args.json);
    }

    info!("Registering {} issues in {}", config.plan.len(), config.repo);

    let report = Registrar::new(tracker, &config.repo, &config.base_dir)
        .run(&config.plan, &sources, |issue| {
            if !args.json {
                println!("{}", progress_line(issue, args.color));
            }
        })
        .context("Registration aborted")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        println!("{json}");
    } else {
        println!();
        println!("{COMPLETION_MESSAGE}");
    }

    Ok(())
}

fn log_dependency_warnings(plan: &Plan) {
    for warning in plan.dependency_warnings() {
        warn!("{}", warning);
    }
}

fn progress_line(issue: &CreatedIssue, color: bool) -> String {
    let number = format!("#{}", issue.number);
    if color {
        format!("{} -> {} ({})", issue.key.bold(), number.green(), issue.url.dimmed())
    } else {
        format!("{} -> {} ({})", issue.key, number, issue.url)
    }
}

fn preview(config: &Config, sources: &SourceCache, json: bool) -> Result<()> {
    let no_numbers = HashMap::new();
    let mut previews = Vec::with_capacity(config.plan.len());

    for issue in config.plan.issues() {
        let source = sources
            .get(&issue.key)
            .with_context(|| format!("No source loaded for {}", issue.key))?;
        previews.push(Preview {
            key: &issue.key,
            title: &source.title,
            body: body_with_plan(&source.raw, &no_numbers, issue),
        });
    }

    if json {
        let json = serde_json::to_string_pretty(&previews).context("Failed to serialize preview")?;
        println!("{json}");
        return Ok(());
    }

    println!("Dry-run: would create {} issues in {}", previews.len(), config.repo);
    for preview in &previews {
        println!();
        println!("{}", "=".repeat(60));
        println!("{}: {}", preview.key, preview.title);
        println!("{}", "-".repeat(60));
        print!("{}", preview.body);
    }

    Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Two-pass registration: create every issue, then patch every body
//!
//! The creation pass renders each footer with whatever numbers are known so
//! far; the patch pass re-renders all of them from the cached raw sources
//! once every number is known.

use crate::body::{body_with_plan, title_from};
use crate::error::{RegistrarError, Result};
use crate::plan::Plan;
use crate::tracker::{parse_issue_number, IssueTracker};
use crate::types::{CreatedIssue, IssueDef, RunReport};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

// =============================================================================
// Raw Body Cache
// =============================================================================

/// Original source text of one definition
#[derive(Debug, Clone)]
pub struct IssueSource {
    /// File content exactly as read
    pub raw: String,
    /// Title derived from the first line
    pub title: String,
}

/// Raw sources keyed by definition key, read once before any issue is filed
#[derive(Debug, Clone, Default)]
pub struct SourceCache {
    entries: HashMap<String, IssueSource>,
}

impl SourceCache {
    /// Read and title every source file of `plan` from `base_dir`.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable file or untitled source.
    pub fn load(plan: &Plan, base_dir: &Path) -> Result<Self> {
        let mut entries = HashMap::with_capacity(plan.len());

        for issue in plan.issues() {
            let path = base_dir.join(&issue.file);
            let raw = std::fs::read_to_string(&path).map_err(|source| RegistrarError::ReadSource {
                key: issue.key.clone(),
                path: path.clone(),
                source,
            })?;
            let title = title_from(&raw).ok_or_else(|| RegistrarError::EmptyTitle {
                key: issue.key.clone(),
                path: path.clone(),
            })?;
            entries.insert(issue.key.clone(), IssueSource { raw, title });
        }

        Ok(Self { entries })
    }

    /// Source for `key`, if loaded
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IssueSource> {
        self.entries.get(key)
    }

    fn require(&self, key: &str) -> Result<&IssueSource> {
        self.get(key)
            .ok_or_else(|| RegistrarError::UnknownIssue(key.to_string()))
    }
}

// =============================================================================
// Scoped Body Files
// =============================================================================

/// Write `body` to a fresh temporary file in `dir`.
///
/// The file is removed when the returned handle is dropped or closed.
///
/// # Errors
///
/// Fails if the file cannot be created or written.
pub fn write_scoped_body(dir: &Path, prefix: &str, body: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".md")
        .tempfile_in(dir)?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn release(file: NamedTempFile, key: &str) {
    let path = file.path().to_path_buf();
    if let Err(err) = file.close() {
        warn!("Failed to remove temporary body {} for {}: {}", path.display(), key, err);
    }
}

// =============================================================================
// Registrar
// =============================================================================

/// Drives both passes against one repository through an [`IssueTracker`]
pub struct Registrar<'a, T: IssueTracker> {
    tracker: &'a mut T,
    repo: &'a str,
    work_dir: &'a Path,
    numbers: HashMap<String, u64>,
}

impl<'a, T: IssueTracker> Registrar<'a, T> {
    /// Registrar filing into `repo`, keeping temporary bodies in `work_dir`
    pub fn new(tracker: &'a mut T, repo: &'a str, work_dir: &'a Path) -> Self {
        Self {
            tracker,
            repo,
            work_dir,
            numbers: HashMap::new(),
        }
    }

    /// Numbers assigned so far, by key
    #[must_use]
    pub fn numbers(&self) -> &HashMap<String, u64> {
        &self.numbers
    }

    /// Run the creation pass followed by the patch pass.
    ///
    /// `on_created` is called as soon as each issue is filed.
    ///
    /// # Errors
    ///
    /// Any tracker or parsing failure aborts the run; issues already filed
    /// stay filed.
    pub fn run<F>(&mut self, plan: &Plan, sources: &SourceCache, on_created: F) -> Result<RunReport>
    where
        F: FnMut(&CreatedIssue),
    {
        let issues = self.create_all(plan, sources, on_created)?;
        self.patch_all(plan, sources)?;

        Ok(RunReport {
            repo: self.repo.to_string(),
            issues,
        })
    }

    /// File every definition in order, recording assigned numbers.
    ///
    /// # Errors
    ///
    /// Stops at the first failed or unparseable creation.
    pub fn create_all<F>(
        &mut self,
        plan: &Plan,
        sources: &SourceCache,
        mut on_created: F,
    ) -> Result<Vec<CreatedIssue>>
    where
        F: FnMut(&CreatedIssue),
    {
        info!("Creating {} issues in {}", plan.len(), self.repo);

        let mut created = Vec::with_capacity(plan.len());
        for issue in plan.issues() {
            let issue = self.create_one(issue, sources)?;
            on_created(&issue);
            created.push(issue);
        }

        Ok(created)
    }

    fn create_one(&mut self, issue: &IssueDef, sources: &SourceCache) -> Result<CreatedIssue> {
        let source = sources.require(&issue.key)?;
        let body = body_with_plan(&source.raw, &self.numbers, issue);

        let body_file = write_scoped_body(self.work_dir, &format!(".tmp-{}-", issue.key), &body)
            .map_err(|source| RegistrarError::TempFile {
                key: issue.key.clone(),
                source,
            })?;

        let outcome = self
            .tracker
            .create_issue(self.repo, &source.title, body_file.path());
        release(body_file, &issue.key);
        let url = outcome?;

        let number = parse_issue_number(&url).ok_or_else(|| RegistrarError::UnparseableResponse {
            key: issue.key.clone(),
            output: url.clone(),
        })?;

        info!("Created {} as #{}", issue.key, number);
        self.numbers.insert(issue.key.clone(), number);

        Ok(CreatedIssue {
            key: issue.key.clone(),
            number,
            url,
        })
    }

    /// Rewrite every body with the numbers gathered by [`Self::create_all`].
    ///
    /// # Errors
    ///
    /// Stops at the first failed edit, or at a definition that was never created.
    pub fn patch_all(&mut self, plan: &Plan, sources: &SourceCache) -> Result<()> {
        info!("Patching dependency footers of {} issues", plan.len());

        for issue in plan.issues() {
            self.patch_one(issue, sources)?;
        }

        Ok(())
    }

    fn patch_one(&mut self, issue: &IssueDef, sources: &SourceCache) -> Result<()> {
        let number = *self
            .numbers
            .get(&issue.key)
            .ok_or_else(|| RegistrarError::UnknownIssue(issue.key.clone()))?;
        let source = sources.require(&issue.key)?;
        let body = body_with_plan(&source.raw, &self.numbers, issue);

        let body_file =
            write_scoped_body(self.work_dir, &format!(".tmp-final-{}-", issue.key), &body)
                .map_err(|source| RegistrarError::TempFile {
                    key: issue.key.clone(),
                    source,
                })?;

        let outcome = self.tracker.edit_issue(self.repo, number, body_file.path());
        release(body_file, &issue.key);
        outcome?;

        info!("Patched #{} ({})", number, issue.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create { title: String, body: String },
        Edit { number: u64, body: String },
    }

    /// Records every call together with the body file content seen at call time
    #[derive(Default)]
    struct FakeTracker {
        calls: Vec<Call>,
        body_files: Vec<PathBuf>,
        next_number: u64,
        fail_create_at: Option<usize>,
        fail_edit_at: Option<usize>,
        bogus_response: bool,
    }

    impl FakeTracker {
        fn starting_at(next_number: u64) -> Self {
            Self {
                next_number,
                ..Default::default()
            }
        }

        fn creates(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Create { .. }))
                .count()
        }

        fn edits(&self) -> usize {
            self.calls.len() - self.creates()
        }
    }

    impl IssueTracker for FakeTracker {
        fn create_issue(&mut self, repo: &str, title: &str, body_file: &Path) -> Result<String> {
            assert_eq!(repo, "acme/widgets");
            let body = std::fs::read_to_string(body_file).expect("body file exists during call");
            self.body_files.push(body_file.to_path_buf());

            if self.fail_create_at == Some(self.creates()) {
                return Err(RegistrarError::TrackerFailed {
                    operation: "create",
                    code: Some(1),
                    stderr: "HTTP 502".into(),
                });
            }

            self.calls.push(Call::Create {
                title: title.into(),
                body,
            });
            if self.bogus_response {
                return Ok("issue created".into());
            }
            let number = self.next_number;
            self.next_number += 1;
            Ok(format!("https://github.com/acme/widgets/issues/{number}"))
        }

        fn edit_issue(&mut self, _repo: &str, number: u64, body_file: &Path) -> Result<()> {
            let body = std::fs::read_to_string(body_file).expect("body file exists during call");
            self.body_files.push(body_file.to_path_buf());

            if self.fail_edit_at == Some(self.edits()) {
                return Err(RegistrarError::TrackerFailed {
                    operation: "edit",
                    code: Some(1),
                    stderr: "not found".into(),
                });
            }

            self.calls.push(Call::Edit { number, body });
            Ok(())
        }
    }

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn sample_plan() -> Plan {
        Plan::new(vec![
            IssueDef::new("BE-01", "be.md", "01/03/2026", &[]),
            IssueDef::new("FE-01", "fe.md", "04/03/2026", &["BE-01"]),
            IssueDef::new("QA-01", "qa.md", "27/03/2026", &["BE-01", "FE-01"]),
        ])
        .unwrap()
    }

    fn sample_workspace() -> TempDir {
        workspace(&[
            ("be.md", "# Auth backend\n\nOAuth endpoints.\n"),
            ("fe.md", "# Auth frontend\n\nLogin screen.\n"),
            ("qa.md", "## Coverage\n\nTests.\n\n"),
        ])
    }

    fn leftover_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".tmp-"))
            .collect()
    }

    #[test]
    fn test_load_reads_titles() {
        let dir = sample_workspace();
        let sources = SourceCache::load(&sample_plan(), dir.path()).unwrap();

        assert_eq!(sources.get("BE-01").unwrap().title, "Auth backend");
        assert_eq!(sources.get("QA-01").unwrap().title, "Coverage");
        assert_eq!(sources.get("QA-01").unwrap().raw, "## Coverage\n\nTests.\n\n");
    }

    #[test]
    fn test_load_fails_on_missing_file() {
        let dir = workspace(&[("be.md", "# Auth\n"), ("fe.md", "# Front\n")]);
        let err = SourceCache::load(&sample_plan(), dir.path()).unwrap_err();

        match err {
            RegistrarError::ReadSource { key, .. } => assert_eq!(key, "QA-01"),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_fails_on_empty_first_line() {
        let dir = workspace(&[("be.md", "\n# Late title\n"), ("fe.md", "# F\n"), ("qa.md", "# Q\n")]);
        let err = SourceCache::load(&sample_plan(), dir.path()).unwrap_err();

        assert!(matches!(err, RegistrarError::EmptyTitle { ref key, .. } if key == "BE-01"));
    }

    #[test]
    fn test_full_run_creates_then_patches() {
        let dir = sample_workspace();
        let plan = sample_plan();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker::starting_at(41);
        let mut seen = Vec::new();

        let report = Registrar::new(&mut tracker, "acme/widgets", dir.path())
            .run(&plan, &sources, |issue| seen.push(issue.key.clone()))
            .unwrap();

        assert_eq!(seen, vec!["BE-01", "FE-01", "QA-01"]);
        assert_eq!(report.repo, "acme/widgets");
        assert_eq!(
            report.issues.iter().map(|i| i.number).collect::<Vec<_>>(),
            vec![41, 42, 43]
        );
        assert_eq!(report.issues[2].url, "https://github.com/acme/widgets/issues/43");

        assert_eq!(tracker.creates(), 3);
        assert_eq!(tracker.edits(), 3);
        match &tracker.calls[1] {
            Call::Create { title, body } => {
                assert_eq!(title, "Auth frontend");
                assert!(body.ends_with("- Depende de: #41\n\n"));
            }
            other => panic!("expected create, got {other:?}"),
        }
        match &tracker.calls[5] {
            Call::Edit { number, body } => {
                assert_eq!(*number, 43);
                assert!(body.contains("- Marco de início planejado: 27/03/2026\n"));
                assert!(body.contains("- Depende de: #41, #42\n"));
                assert_eq!(body.matches("---\n").count(), 1);
            }
            other => panic!("expected edit, got {other:?}"),
        }
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[test]
    fn test_forward_reference_resolved_by_patch() {
        let dir = workspace(&[("fe.md", "# Front\n"), ("be.md", "# Back\n")]);
        let plan = Plan::new(vec![
            IssueDef::new("FE-01", "fe.md", "04/03/2026", &["BE-01"]),
            IssueDef::new("BE-01", "be.md", "01/03/2026", &[]),
        ])
        .unwrap();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker::starting_at(10);

        Registrar::new(&mut tracker, "acme/widgets", dir.path())
            .run(&plan, &sources, |_| {})
            .unwrap();

        match (&tracker.calls[0], &tracker.calls[2]) {
            (Call::Create { body: created, .. }, Call::Edit { number, body: patched }) => {
                assert!(created.contains("- Depende de: BE-01\n"));
                assert_eq!(*number, 10);
                assert!(patched.contains("- Depende de: #11\n"));
            }
            other => panic!("unexpected calls {other:?}"),
        }
    }

    #[test]
    fn test_create_failure_aborts_and_cleans_up() {
        let dir = sample_workspace();
        let plan = sample_plan();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker {
            fail_create_at: Some(1),
            next_number: 1,
            ..Default::default()
        };

        let mut registrar = Registrar::new(&mut tracker, "acme/widgets", dir.path());
        let err = registrar.run(&plan, &sources, |_| {}).unwrap_err();

        assert!(matches!(err, RegistrarError::TrackerFailed { operation: "create", .. }));
        assert_eq!(registrar.numbers().len(), 1);
        assert_eq!(tracker.creates(), 1);
        assert_eq!(tracker.edits(), 0);
        assert_eq!(tracker.body_files.len(), 2);
        for path in &tracker.body_files {
            assert!(!path.exists(), "{} was left behind", path.display());
        }
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[test]
    fn test_edit_failure_cleans_up() {
        let dir = sample_workspace();
        let plan = sample_plan();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker {
            fail_edit_at: Some(0),
            next_number: 5,
            ..Default::default()
        };

        let err = Registrar::new(&mut tracker, "acme/widgets", dir.path())
            .run(&plan, &sources, |_| {})
            .unwrap_err();

        assert!(matches!(err, RegistrarError::TrackerFailed { operation: "edit", .. }));
        assert_eq!(tracker.body_files.len(), 4);
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[test]
    fn test_unparseable_response_records_nothing() {
        let dir = sample_workspace();
        let plan = sample_plan();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker {
            bogus_response: true,
            ..Default::default()
        };

        let mut registrar = Registrar::new(&mut tracker, "acme/widgets", dir.path());
        let err = registrar.run(&plan, &sources, |_| {}).unwrap_err();

        match err {
            RegistrarError::UnparseableResponse { key, output } => {
                assert_eq!(key, "BE-01");
                assert_eq!(output, "issue created");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(registrar.numbers().is_empty());
        assert!(leftover_files(dir.path()).is_empty());
    }

    #[test]
    fn test_patch_requires_created_issue() {
        let dir = sample_workspace();
        let plan = sample_plan();
        let sources = SourceCache::load(&plan, dir.path()).unwrap();
        let mut tracker = FakeTracker::default();

        let err = Registrar::new(&mut tracker, "acme/widgets", dir.path())
            .patch_all(&plan, &sources)
            .unwrap_err();

        assert!(matches!(err, RegistrarError::UnknownIssue(ref key) if key == "BE-01"));
        assert!(tracker.calls.is_empty());
    }

    #[test]
    fn test_scoped_body_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let file = write_scoped_body(dir.path(), ".tmp-BE-01-", "body").unwrap();
        let path = file.path().to_path_buf();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "body");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with(".tmp-BE-01-"));
        drop(file);
        assert!(!path.exists());
    }
}

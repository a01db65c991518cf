use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{CheckResult, CheckStatus, RepoId};

/// Ordered results of one analysis run.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Report {
    pub repo: RepoId,
    pub results: Vec<CheckResult>,
}

/// Title and markdown body of an issue to file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
}

impl Report {
    pub fn new(repo: RepoId) -> Self { Self { repo, results: vec![] } }

    pub fn push(&mut self, result: CheckResult) {
        tracing::debug!(
            check = result.kind.as_str(),
            status = %result.status,
            "{}",
            result.message
        );
        self.results.push(result);
    }

    /// One line per check performed.
    pub fn lines(&self) -> Vec<String> {
        self.results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!("{} {}. {}: {}", result.status.icon(), i + 1, result.kind, result.message)
            })
            .collect()
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Repository Analysis Report for {}:\n", self.repo);
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    pub fn render_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Checks that failed outright. Checks whose data was unavailable are not included.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.status == CheckStatus::Fail)
    }

    pub fn passed_count(&self) -> usize { self.results.iter().filter(|r| r.passed()).count() }

    /// A single issue listing every failed check, or `None` if nothing failed.
    pub fn tracking_issue(&self) -> Option<IssueDraft> {
        let failures = self.failures().collect::<Vec<_>>();
        if failures.is_empty() {
            return None;
        }
        let mut body = format!(
            "RepoSpector flagged {} of {} checks for `{}`.\n\n",
            failures.len(),
            self.results.len(),
            self.repo
        );
        for result in &failures {
            body.push_str(&format!("- [ ] **{}**: {}\n", result.kind, result.message));
        }
        Some(IssueDraft {
            title: format!(
                "Repository health: {} failed {}",
                failures.len(),
                if failures.len() == 1 { "check" } else { "checks" }
            ),
            body,
        })
    }

    /// One issue per failed check.
    pub fn per_check_issues(&self) -> Vec<IssueDraft> {
        self.failures()
            .map(|result| IssueDraft {
                title: result.kind.issue_title().to_string(),
                body: result.message.clone(),
            })
            .collect()
    }
}

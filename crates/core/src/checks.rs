//! Evaluation of each check against data already fetched from the API.
//!
//! Every function here is pure: the analysis driver performs the requests and
//! hands the results over, so the pass/fail rules can be tested without a
//! network.

use time::{Duration, OffsetDateTime};

use crate::models::{CheckKind, CheckResult, LicenseInfo, SecurityAlert, Severity};

/// Whether any of `comments` contains one of `keywords`, ignoring case.
pub fn mentions_any<S: AsRef<str>>(comments: &[S], keywords: &[String]) -> bool {
    comments.iter().any(|comment| {
        let comment = comment.as_ref().to_lowercase();
        keywords.iter().any(|keyword| comment.contains(&keyword.to_lowercase()))
    })
}

pub fn documentation(readme: Option<&str>, sections: &[String]) -> CheckResult {
    let Some(readme) = readme else {
        return CheckResult::fail(CheckKind::Documentation, "README.md file is missing.");
    };
    let readme = readme.to_lowercase();
    let missing = sections
        .iter()
        .filter(|section| !readme.contains(&section.to_lowercase()))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if missing.is_empty() {
        CheckResult::pass(
            CheckKind::Documentation,
            "README.md is present and contains all essential sections.",
        )
    } else {
        CheckResult::fail(
            CheckKind::Documentation,
            format!("README.md is present but missing sections: {}.", missing.join(", ")),
        )
    }
}

fn is_stale(updated_at: OffsetDateTime, now: OffsetDateTime, stale_after: Duration) -> bool {
    now - updated_at > stale_after
}

/// `unresolved` holds the open issues with no resolving comment.
pub fn open_issues(
    unresolved: &[OffsetDateTime],
    now: OffsetDateTime,
    stale_after: Duration,
) -> CheckResult {
    unresolved_activity(CheckKind::OpenIssues, "issues", unresolved, now, stale_after)
}

/// `unresolved` holds the open, unmerged pull requests with no addressing comment.
pub fn open_pulls(
    unresolved: &[OffsetDateTime],
    now: OffsetDateTime,
    stale_after: Duration,
) -> CheckResult {
    unresolved_activity(CheckKind::OpenPullRequests, "pull requests", unresolved, now, stale_after)
}

fn unresolved_activity(
    kind: CheckKind,
    noun: &str,
    unresolved: &[OffsetDateTime],
    now: OffsetDateTime,
    stale_after: Duration,
) -> CheckResult {
    if unresolved.is_empty() {
        return CheckResult::pass(kind, format!("No unresolved open {noun}."));
    }
    let stale =
        unresolved.iter().filter(|&&updated_at| is_stale(updated_at, now, stale_after)).count();
    if stale > 0 {
        CheckResult::fail(
            kind,
            format!(
                "Found {} unresolved open {noun}, including {stale} with long inactivity.",
                unresolved.len()
            ),
        )
    } else {
        CheckResult::pass(kind, format!("Found {} unresolved open {noun}.", unresolved.len()))
    }
}

pub fn dependencies(found: &[String], checked: &[String]) -> CheckResult {
    if found.is_empty() {
        CheckResult::fail(
            CheckKind::Dependencies,
            format!("No dependency manifest found (checked {}).", checked.join(", ")),
        )
    } else {
        CheckResult::pass(
            CheckKind::Dependencies,
            format!("Found {}; contents not analyzed further.", found.join(", ")),
        )
    }
}

/// `alerts` is `None` when the alerts could not be retrieved.
pub fn security(alerts: Option<&[SecurityAlert]>) -> CheckResult {
    let Some(alerts) = alerts else {
        return CheckResult::unavailable(
            CheckKind::Security,
            "Could not retrieve security alerts.",
        );
    };
    if alerts.is_empty() {
        return CheckResult::pass(CheckKind::Security, "No reported vulnerabilities.");
    }
    let count = |severity| alerts.iter().filter(|a| a.severity == severity).count();
    let critical = count(Severity::Critical);
    let mut message = format!(
        "Found {} open security {} ({critical} critical {}",
        alerts.len(),
        if alerts.len() == 1 { "alert" } else { "alerts" },
        if critical == 1 { "issue" } else { "issues" },
    );
    for severity in [Severity::High, Severity::Medium, Severity::Low, Severity::Unknown] {
        let n = count(severity);
        if n > 0 {
            message.push_str(&format!(", {n} {}", severity_label(severity)));
        }
    }
    message.push_str(").");
    CheckResult::fail(CheckKind::Security, message)
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
        Severity::Unknown => "unknown",
    }
}

pub fn license(license: Option<&LicenseInfo>) -> CheckResult {
    match license {
        Some(info) => {
            let message = match info.spdx_id.as_deref() {
                // GitHub reports unrecognised license text as NOASSERTION.
                Some(id) if id != "NOASSERTION" => {
                    format!("License file is present with {} license ({id}).", info.name)
                }
                _ => format!("License file is present with {} license.", info.name),
            };
            CheckResult::pass(CheckKind::License, message)
        }
        None => CheckResult::fail(CheckKind::License, "License file is missing."),
    }
}

/// Checks that only look for a file or directory in the repository.
pub fn presence(kind: CheckKind, exists: bool) -> CheckResult {
    let subject = match kind {
        CheckKind::ContributingGuidelines => "Contributing guidelines are",
        CheckKind::IssueTemplates => "Issue templates are",
        CheckKind::PullRequestTemplates => "Pull request templates are",
        CheckKind::Changelog => "Changelog is",
        _ => "File is",
    };
    if exists {
        CheckResult::pass(kind, format!("{subject} present."))
    } else {
        CheckResult::fail(kind, format!("{subject} missing."))
    }
}

use anyhow::{Context, Result};
use time::OffsetDateTime;

use crate::{
    checks,
    config::{ChecksConfig, IssueMode, IssuesConfig},
    models::{CheckKind, CreatedIssue, RepoId},
    report::Report,
    source::RepoSource,
};

pub const CONTRIBUTING_PATH: &str = "CONTRIBUTING.md";
pub const ISSUE_TEMPLATE_PATH: &str = ".github/ISSUE_TEMPLATE";
pub const PULL_REQUEST_TEMPLATE_PATH: &str = ".github/PULL_REQUEST_TEMPLATE.md";
pub const CHANGELOG_PATH: &str = "CHANGELOG.md";

/// Run every check against `source`, in report order.
pub async fn analyze<S: RepoSource>(
    source: &S,
    repo: &RepoId,
    config: &ChecksConfig,
    now: OffsetDateTime,
) -> Result<Report> {
    let mut report = Report::new(repo.clone());
    let stale_after = config.stale_after();

    let readme = source.readme().await.context("Failed to fetch README")?;
    report.push(checks::documentation(readme.as_deref(), &config.readme_sections));

    let issues = source.open_issues().await.context("Failed to fetch open issues")?;
    let mut unresolved = vec![];
    for issue in issues.iter().filter(|i| !i.is_pull_request) {
        let comments = source
            .issue_comments(issue.number)
            .await
            .with_context(|| format!("Failed to fetch comments for issue #{}", issue.number))?;
        if !checks::mentions_any(&comments, &config.resolved_keywords) {
            unresolved.push(issue.updated_at);
        }
    }
    tracing::info!("{} of {} open issues unresolved", unresolved.len(), issues.len());
    report.push(checks::open_issues(&unresolved, now, stale_after));

    let pulls = source.open_pulls().await.context("Failed to fetch open pull requests")?;
    let mut unresolved = vec![];
    for pull in pulls.iter().filter(|p| !p.merged) {
        let comments = source
            .issue_comments(pull.number)
            .await
            .with_context(|| format!("Failed to fetch comments for pull request #{}", pull.number))?;
        if !checks::mentions_any(&comments, &config.addressed_keywords) {
            unresolved.push(pull.updated_at);
        }
    }
    tracing::info!("{} of {} open pull requests unresolved", unresolved.len(), pulls.len());
    report.push(checks::open_pulls(&unresolved, now, stale_after));

    let mut manifests = vec![];
    for file in &config.manifest_files {
        if source.path_exists(file).await.with_context(|| format!("Failed to look up {file}"))? {
            manifests.push(file.clone());
        }
    }
    report.push(checks::dependencies(&manifests, &config.manifest_files));

    let alerts = source.security_alerts().await.context("Failed to fetch security alerts")?;
    report.push(checks::security(alerts.as_deref()));

    let license = source.license().await.context("Failed to fetch license")?;
    report.push(checks::license(license.as_ref()));

    for (kind, path) in [
        (CheckKind::ContributingGuidelines, CONTRIBUTING_PATH),
        (CheckKind::IssueTemplates, ISSUE_TEMPLATE_PATH),
        (CheckKind::PullRequestTemplates, PULL_REQUEST_TEMPLATE_PATH),
        (CheckKind::Changelog, CHANGELOG_PATH),
    ] {
        let exists =
            source.path_exists(path).await.with_context(|| format!("Failed to look up {path}"))?;
        report.push(checks::presence(kind, exists));
    }

    tracing::info!(
        "Analyzed {}: {} of {} checks passed",
        repo,
        report.passed_count(),
        report.results.len()
    );
    Ok(report)
}

/// File issues for the failed checks of `report`.
pub async fn file_issues<S: RepoSource>(
    source: &S,
    report: &Report,
    config: &IssuesConfig,
) -> Result<Vec<CreatedIssue>> {
    let drafts = match config.mode {
        IssueMode::Tracking => report.tracking_issue().into_iter().collect(),
        IssueMode::PerCheck => report.per_check_issues(),
    };
    if drafts.is_empty() {
        tracing::info!("No failed checks, not filing any issues");
        return Ok(vec![]);
    }
    let mut created = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let issue = source
            .create_issue(&draft.title, &draft.body, &config.labels)
            .await
            .with_context(|| format!("Failed to create issue '{}'", draft.title))?;
        tracing::info!("Issue created: #{} {}", issue.number, issue.title);
        created.push(issue);
    }
    Ok(created)
}

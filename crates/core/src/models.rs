use std::{fmt, str::FromStr, sync::OnceLock};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

/// Repository identifier, `owner/name`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RepoIdError {
    #[error("Invalid repository '{0}', expected owner/name")]
    Malformed(String),
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }
}

fn github_url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"^https?://(?:www\.)?github\.com/(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+?)(?:\.git)?(?:[/?#]|$)",
        )
        .unwrap()
    })
}

/// Accepts `owner/name` or a github.com repository URL.
impl FromStr for RepoId {
    type Err = RepoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(caps) = github_url_regex().captures(s) {
            return Ok(Self::new(&caps["owner"], &caps["repo"]));
        }
        if s.contains("://") {
            return Err(RepoIdError::Malformed(s.to_string()));
        }
        let trimmed = s.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty()
                    && !name.is_empty()
                    && !name.contains('/')
                    && !owner.contains(char::is_whitespace)
                    && !name.contains(char::is_whitespace) =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(RepoIdError::Malformed(s.to_string())),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Documentation,
    OpenIssues,
    OpenPullRequests,
    Dependencies,
    Security,
    License,
    ContributingGuidelines,
    IssueTemplates,
    PullRequestTemplates,
    Changelog,
}

impl CheckKind {
    /// All checks, in report order.
    pub const fn variants() -> &'static [Self] {
        &[
            Self::Documentation,
            Self::OpenIssues,
            Self::OpenPullRequests,
            Self::Dependencies,
            Self::Security,
            Self::License,
            Self::ContributingGuidelines,
            Self::IssueTemplates,
            Self::PullRequestTemplates,
            Self::Changelog,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::OpenIssues => "open_issues",
            Self::OpenPullRequests => "open_pull_requests",
            Self::Dependencies => "dependencies",
            Self::Security => "security",
            Self::License => "license",
            Self::ContributingGuidelines => "contributing_guidelines",
            Self::IssueTemplates => "issue_templates",
            Self::PullRequestTemplates => "pull_request_templates",
            Self::Changelog => "changelog",
        }
    }

    /// Title used when filing an issue for this check alone.
    pub fn issue_title(&self) -> &'static str {
        match self {
            Self::Documentation => "Missing README.md or essential sections",
            Self::OpenIssues => "Unresolved issues with long inactivity",
            Self::OpenPullRequests => "Unresolved pull requests with long inactivity",
            Self::Dependencies => "Missing dependency files",
            Self::Security => "Security vulnerabilities detected",
            Self::License => "License file missing",
            Self::ContributingGuidelines => "Contributing guidelines missing",
            Self::IssueTemplates => "Issue templates missing",
            Self::PullRequestTemplates => "Pull request templates missing",
            Self::Changelog => "Changelog missing",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Documentation => "Documentation",
            Self::OpenIssues => "Open Issues",
            Self::OpenPullRequests => "Open Pull Requests",
            Self::Dependencies => "Dependencies Status",
            Self::Security => "Security Status",
            Self::License => "License",
            Self::ContributingGuidelines => "Contributing Guidelines",
            Self::IssueTemplates => "Issue Templates",
            Self::PullRequestTemplates => "Pull Request Templates",
            Self::Changelog => "Changelog",
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The data backing the check could not be retrieved.
    Unavailable,
}

impl CheckStatus {
    pub fn passed(&self) -> bool { matches!(self, Self::Pass) }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pass => "✅",
            Self::Fail | Self::Unavailable => "❌",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Unavailable => "unavailable",
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    pub fn pass(kind: CheckKind, message: impl Into<String>) -> Self {
        Self { kind, status: CheckStatus::Pass, message: message.into() }
    }

    pub fn fail(kind: CheckKind, message: impl Into<String>) -> Self {
        Self { kind, status: CheckStatus::Fail, message: message.into() }
    }

    pub fn unavailable(kind: CheckKind, message: impl Into<String>) -> Self {
        Self { kind, status: CheckStatus::Unavailable, message: message.into() }
    }

    pub fn passed(&self) -> bool { self.status.passed() }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IssueSummary {
    pub number: u64,
    pub updated_at: OffsetDateTime,
    /// The issues endpoint also lists pull requests.
    pub is_pull_request: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PullSummary {
    pub number: u64,
    pub merged: bool,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LicenseInfo {
    pub name: String,
    pub spdx_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" | "moderate" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SecurityAlert {
    pub severity: Severity,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

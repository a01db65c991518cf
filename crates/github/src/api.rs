//! Response shapes for the REST endpoints read by [`RepoHandle`](crate::RepoHandle).
//! Only the fields the checks look at are declared.

use repospector_core::models::{IssueSummary, LicenseInfo, PullSummary, SecurityAlert, Severity};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Serialize)]
pub(crate) struct ListParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoInfo {
    pub full_name: String,
    pub default_branch: Option<String>,
}

/// Files over 1 MB come back with `encoding: "none"` and empty content.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentFile {
    pub content: Option<String>,
    pub encoding: Option<String>,
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LicenseResponse {
    pub license: Option<LicenseField>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LicenseField {
    pub name: String,
    pub spdx_id: Option<String>,
}

impl LicenseResponse {
    pub fn into_info(self) -> Option<LicenseInfo> {
        self.license.map(|l| LicenseInfo { name: l.name, spdx_id: l.spdx_id })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueItem {
    pub number: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub pull_request: Option<serde_json::Value>,
}

impl From<IssueItem> for IssueSummary {
    fn from(value: IssueItem) -> Self {
        Self {
            number: value.number,
            updated_at: value.updated_at,
            is_pull_request: value.pull_request.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullItem {
    pub number: u64,
    pub merged_at: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PullItem> for PullSummary {
    fn from(value: PullItem) -> Self {
        Self {
            number: value.number,
            merged: value.merged_at.is_some(),
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentItem {
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlertItem {
    pub security_advisory: Option<SeverityField>,
    pub security_vulnerability: Option<SeverityField>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeverityField {
    pub severity: Option<String>,
}

impl AlertItem {
    /// Prefer the advisory severity, falling back to the vulnerable package's.
    pub fn to_alert(&self) -> SecurityAlert {
        let severity = [&self.security_advisory, &self.security_vulnerability]
            .into_iter()
            .flatten()
            .find_map(|field| field.severity.as_deref()?.parse::<Severity>().ok())
            .unwrap_or(Severity::Unknown);
        SecurityAlert { severity }
    }
}

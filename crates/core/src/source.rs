use anyhow::Result;

use crate::models::{CreatedIssue, IssueSummary, LicenseInfo, PullSummary, SecurityAlert};

/// Read and write access to a single repository on the hosting platform.
///
/// File-level lookups report absence as `None`/`false`. Any other failure is
/// returned as an error and aborts the analysis.
#[allow(async_fn_in_trait)]
pub trait RepoSource {
    /// Decoded contents of the repository README.
    async fn readme(&self) -> Result<Option<String>>;

    async fn license(&self) -> Result<Option<LicenseInfo>>;

    /// Whether a file or directory exists at `path` on the default branch.
    async fn path_exists(&self, path: &str) -> Result<bool>;

    /// Open issues. May include pull requests, flagged by `is_pull_request`.
    async fn open_issues(&self) -> Result<Vec<IssueSummary>>;

    /// Comment bodies on an issue or pull request.
    async fn issue_comments(&self, number: u64) -> Result<Vec<String>>;

    async fn open_pulls(&self) -> Result<Vec<PullSummary>>;

    /// Open security alerts, or `None` if they cannot be read.
    async fn security_alerts(&self) -> Result<Option<Vec<SecurityAlert>>>;

    async fn create_issue(&self, title: &str, body: &str, labels: &[String])
    -> Result<CreatedIssue>;
}

#[cfg(test)]
pub(crate) mod stub {
    use std::{
        cell::RefCell,
        collections::{HashMap, HashSet},
    };

    use anyhow::{Result, anyhow};

    use super::RepoSource;
    use crate::models::{CreatedIssue, IssueSummary, LicenseInfo, PullSummary, SecurityAlert};

    /// In-memory repository used to drive the analysis in tests.
    #[derive(Default)]
    pub struct StubSource {
        pub readme: Option<String>,
        pub license: Option<LicenseInfo>,
        pub paths: HashSet<String>,
        pub issues: Vec<IssueSummary>,
        pub pulls: Vec<PullSummary>,
        pub comments: HashMap<u64, Vec<String>>,
        pub alerts: Option<Vec<SecurityAlert>>,
        /// Fail every request with this message.
        pub error: Option<String>,
        pub created: RefCell<Vec<(String, String, Vec<String>)>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StubSource {
        fn request(&self, what: impl Into<String>) -> Result<()> {
            self.requests.borrow_mut().push(what.into());
            match &self.error {
                Some(message) => Err(anyhow!("{message}")),
                None => Ok(()),
            }
        }
    }

    impl RepoSource for StubSource {
        async fn readme(&self) -> Result<Option<String>> {
            self.request("readme")?;
            Ok(self.readme.clone())
        }

        async fn license(&self) -> Result<Option<LicenseInfo>> {
            self.request("license")?;
            Ok(self.license.clone())
        }

        async fn path_exists(&self, path: &str) -> Result<bool> {
            self.request(format!("contents/{path}"))?;
            Ok(self.paths.contains(path))
        }

        async fn open_issues(&self) -> Result<Vec<IssueSummary>> {
            self.request("issues")?;
            Ok(self.issues.clone())
        }

        async fn issue_comments(&self, number: u64) -> Result<Vec<String>> {
            self.request(format!("issues/{number}/comments"))?;
            Ok(self.comments.get(&number).cloned().unwrap_or_default())
        }

        async fn open_pulls(&self) -> Result<Vec<PullSummary>> {
            self.request("pulls")?;
            Ok(self.pulls.clone())
        }

        async fn security_alerts(&self) -> Result<Option<Vec<SecurityAlert>>> {
            self.request("dependabot/alerts")?;
            Ok(self.alerts.clone())
        }

        async fn create_issue(
            &self,
            title: &str,
            body: &str,
            labels: &[String],
        ) -> Result<CreatedIssue> {
            self.request("create issue")?;
            let mut created = self.created.borrow_mut();
            created.push((title.to_string(), body.to_string(), labels.to_vec()));
            let number = created.len() as u64;
            Ok(CreatedIssue {
                number,
                title: title.to_string(),
                html_url: format!("https://github.com/octo/spoon/issues/{number}"),
            })
        }
    }
}

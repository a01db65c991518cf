mod api;

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use http::StatusCode;
use octocrab::Octocrab;
use repospector_core::{
    RepoSource,
    config::GitHubConfig,
    models::{CreatedIssue, IssueSummary, LicenseInfo, PullSummary, RepoId, SecurityAlert},
};
use serde::de::DeserializeOwned;

use crate::api::{
    AlertItem, CommentItem, ContentFile, IssueItem, LicenseResponse, ListParams, PullItem,
    RepoInfo,
};

const PER_PAGE: u8 = 100;

#[derive(Clone)]
pub struct GitHub {
    pub client: Octocrab,
}

impl GitHub {
    /// Build a client for `token`. No request is made until the repository is looked up.
    pub fn new(config: &GitHubConfig, token: String) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(api_url) = &config.api_url {
            tracing::debug!("Using GitHub API at {}", api_url);
            builder = builder
                .base_uri(api_url.as_str())
                .with_context(|| format!("Invalid GitHub API URL {api_url}"))?;
        }
        let client = builder.build().context("Failed to create GitHub client")?;
        Ok(Self { client })
    }

    /// Look up `repo`, failing if it does not exist or is not visible to the token.
    pub async fn repo(&self, repo: RepoId) -> Result<RepoHandle> {
        let route = format!("/repos/{}/{}", repo.owner, repo.name);
        let info = match self.client.get::<RepoInfo, _, ()>(&route, None).await {
            Ok(info) => info,
            Err(e) if is_status(&e, StatusCode::NOT_FOUND) => {
                anyhow::bail!("Repository {repo} not found or not accessible");
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to fetch repository {repo}")),
        };
        tracing::debug!(
            "Repository {} (default branch {})",
            info.full_name,
            info.default_branch.as_deref().unwrap_or("main")
        );
        Ok(RepoHandle { client: self.client.clone(), repo })
    }
}

/// API access scoped to one repository.
#[derive(Clone)]
pub struct RepoHandle {
    client: Octocrab,
    repo: RepoId,
}

fn is_status(err: &octocrab::Error, status: StatusCode) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code == status)
}

/// The API's own message for `err`, without octocrab's wrapper text.
fn api_message(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => source.message.clone(),
        err => err.to_string(),
    }
}

impl RepoHandle {
    fn route(&self, path: &str) -> String {
        format!("/repos/{}/{}/{}", self.repo.owner, self.repo.name, path)
    }

    /// GET a single object, mapping 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let route = self.route(path);
        match self.client.get::<T, _, ()>(&route, None).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if is_status(&e, StatusCode::NOT_FOUND) => {
                tracing::debug!("{} not found", route);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Request to {route} failed")),
        }
    }

    /// GET every page of a list endpoint.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        state: Option<&str>,
    ) -> Result<Vec<T>> {
        let route = self.route(path);
        let mut items = vec![];
        let mut page = 1u32;
        loop {
            let params = ListParams { state, per_page: Some(PER_PAGE), page: Some(page) };
            let batch: Vec<T> = self
                .client
                .get(&route, Some(&params))
                .await
                .with_context(|| format!("Failed to fetch {route} page {page}"))?;
            let done = batch.len() < PER_PAGE as usize;
            items.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        tracing::debug!("Fetched {} items from {}", items.len(), route);
        Ok(items)
    }

    /// Fetch a file too large for the contents API from its raw download URL.
    async fn download(&self, url: &str) -> Result<String> {
        tracing::debug!("Downloading {}", url);
        let response =
            self.client._get(url).await.with_context(|| format!("Failed to fetch {url}"))?;
        let response = octocrab::map_github_error(response)
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;
        self.client.body_to_string(response).await.with_context(|| format!("Failed to read {url}"))
    }
}

impl RepoSource for RepoHandle {
    async fn readme(&self) -> Result<Option<String>> {
        let Some(file) = self.get_optional::<ContentFile>("readme").await? else {
            return Ok(None);
        };
        match decode_content(&file)? {
            Some(text) => Ok(Some(text)),
            None => {
                let url = file
                    .download_url
                    .as_deref()
                    .context("README is too large to inspect and has no download URL")?;
                self.download(url).await.map(Some)
            }
        }
    }

    async fn license(&self) -> Result<Option<LicenseInfo>> {
        let response = self.get_optional::<LicenseResponse>("license").await?;
        Ok(response.and_then(LicenseResponse::into_info))
    }

    async fn path_exists(&self, path: &str) -> Result<bool> {
        let found = self.get_optional::<serde_json::Value>(&format!("contents/{path}")).await?;
        Ok(found.is_some())
    }

    async fn open_issues(&self) -> Result<Vec<IssueSummary>> {
        let items = self.list_all::<IssueItem>("issues", Some("open")).await?;
        Ok(items.into_iter().map(IssueSummary::from).collect())
    }

    async fn issue_comments(&self, number: u64) -> Result<Vec<String>> {
        let items =
            self.list_all::<CommentItem>(&format!("issues/{number}/comments"), None).await?;
        Ok(items.into_iter().filter_map(|c| c.body).collect())
    }

    async fn open_pulls(&self) -> Result<Vec<PullSummary>> {
        let items = self.list_all::<PullItem>("pulls", Some("open")).await?;
        Ok(items.into_iter().map(PullSummary::from).collect())
    }

    async fn security_alerts(&self) -> Result<Option<Vec<SecurityAlert>>> {
        // Dependabot alerts paginate by cursor; only the first page is read.
        let route = self.route("dependabot/alerts");
        let params = ListParams { state: Some("open"), per_page: Some(PER_PAGE), page: None };
        match self.client.get::<Vec<AlertItem>, _, _>(&route, Some(&params)).await {
            Ok(items) => {
                if items.len() == PER_PAGE as usize {
                    tracing::warn!(
                        "More than {} open security alerts, counting the first page",
                        PER_PAGE
                    );
                }
                Ok(Some(items.iter().map(AlertItem::to_alert).collect()))
            }
            Err(e)
                if is_status(&e, StatusCode::NOT_FOUND) || is_status(&e, StatusCode::FORBIDDEN) =>
            {
                tracing::warn!(
                    "Security alerts for {} are not available: {}",
                    self.repo,
                    api_message(&e)
                );
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Request to {route} failed")),
        }
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<CreatedIssue> {
        let issues = self.client.issues(&self.repo.owner, &self.repo.name);
        let mut request = issues.create(title).body(body);
        if !labels.is_empty() {
            request = request.labels(labels.to_vec());
        }
        let issue = request.send().await.context("Failed to create issue")?;
        Ok(CreatedIssue {
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url.to_string(),
        })
    }
}

/// Decoded file text, or `None` when the API left the content out.
fn decode_content(file: &ContentFile) -> Result<Option<String>> {
    let content = file.content.as_deref().unwrap_or_default();
    match file.encoding.as_deref() {
        Some("none") => Ok(None),
        Some("base64") | None if content.is_empty() => Ok(None),
        Some("base64") | None => {
            // The API wraps base64 content at 60 columns.
            let compact = content.chars().filter(|c| !c.is_ascii_whitespace()).collect::<String>();
            let bytes = STANDARD.decode(compact).context("Failed to decode file content")?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Some(_) => Ok(Some(content.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Maps `(base_url, request_target)` to a status and JSON body.
    type Responder = fn(&str, &str) -> (StatusCode, String);

    /// Local HTTP server answering with canned GitHub API responses.
    struct MockApi {
        base_url: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockApi {
        async fn start(respond: Responder) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(vec![]));
            let recorded = requests.clone();
            let base = base_url.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let recorded = recorded.clone();
                    let base = base.clone();
                    tokio::spawn(async move {
                        let mut head = vec![];
                        let mut chunk = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match stream.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&chunk[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&head);
                        let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                        let (status, body) = respond(&base, &target);
                        recorded.lock().unwrap().push(target);
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or_default(),
                            body.len(),
                            body
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });
            Self { base_url, requests }
        }

        fn client(&self) -> GitHub {
            let config = GitHubConfig {
                api_url: Some(format!("{}/", self.base_url).parse().unwrap()),
                ..Default::default()
            };
            GitHub::new(&config, "test-token".to_string()).unwrap()
        }

        fn handle(&self) -> RepoHandle {
            RepoHandle { client: self.client().client, repo: RepoId::new("o", "r") }
        }

        fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }
    }

    fn error(status: StatusCode, message: &str) -> (StatusCode, String) {
        let body = serde_json::json!({
            "message": message,
            "documentation_url": "https://docs.github.com/rest",
        });
        (status, body.to_string())
    }

    fn issues_page(first: u64, count: u64) -> String {
        let items = (first..first + count)
            .map(|number| {
                serde_json::json!({
                    "number": number,
                    "title": format!("Issue {number}"),
                    "updated_at": "2024-05-01T00:00:00Z",
                })
            })
            .collect::<Vec<_>>();
        serde_json::Value::from(items).to_string()
    }

    fn respond(base: &str, target: &str) -> (StatusCode, String) {
        match target {
            "/user" => error(StatusCode::FORBIDDEN, "Resource not accessible by integration"),
            "/repos/o/r" => (
                StatusCode::OK,
                r#"{"id": 1, "full_name": "o/r", "default_branch": "main"}"#.to_string(),
            ),
            "/repos/missing/r" => error(StatusCode::NOT_FOUND, "Not Found"),
            "/repos/o/r/readme" => (
                StatusCode::OK,
                serde_json::json!({
                    "name": "README.md",
                    "size": 2_000_000,
                    "encoding": "none",
                    "content": "",
                    "download_url": format!("{base}/raw/README.md"),
                })
                .to_string(),
            ),
            "/raw/README.md" => (StatusCode::OK, "## Installation\n## Usage\n".to_string()),
            "/repos/o/r/license" => error(StatusCode::UNAUTHORIZED, "Bad credentials"),
            "/repos/locked/r/readme" => error(StatusCode::UNAUTHORIZED, "Bad credentials"),
            "/repos/o/r/contents/CHANGELOG.md" => error(StatusCode::NOT_FOUND, "Not Found"),
            "/repos/o/r/contents/CONTRIBUTING.md" => {
                (StatusCode::OK, r#"{"name": "CONTRIBUTING.md", "type": "file"}"#.to_string())
            }
            "/repos/o/r/dependabot/alerts?state=open&per_page=100" => {
                error(StatusCode::FORBIDDEN, "Dependabot alerts are disabled for this repository.")
            }
            "/repos/o/r/issues?state=open&per_page=100&page=1" => {
                (StatusCode::OK, issues_page(1, 100))
            }
            "/repos/o/r/issues?state=open&per_page=100&page=2" => {
                (StatusCode::OK, issues_page(101, 3))
            }
            _ => error(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    #[tokio::test]
    async fn test_client_makes_no_user_request() {
        let api = MockApi::start(respond).await;
        let github = api.client();
        let handle = github.repo(RepoId::new("o", "r")).await.unwrap();
        assert_eq!(handle.repo, RepoId::new("o", "r"));
        assert_eq!(api.requests(), vec!["/repos/o/r".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let api = MockApi::start(respond).await;
        let err = api.client().repo(RepoId::new("missing", "r")).await.err().unwrap();
        assert_eq!(err.to_string(), "Repository missing/r not found or not accessible");
    }

    #[tokio::test]
    async fn test_missing_file_is_false() {
        let api = MockApi::start(respond).await;
        let handle = api.handle();
        assert!(!handle.path_exists("CHANGELOG.md").await.unwrap());
        assert!(handle.path_exists("CONTRIBUTING.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_forbidden_alerts_are_unavailable() {
        let api = MockApi::start(respond).await;
        assert_eq!(api.handle().security_alerts().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_message_strips_wrapper() {
        let api = MockApi::start(respond).await;
        let route = "/repos/o/r/dependabot/alerts?state=open&per_page=100";
        let err =
            api.client().client.get::<serde_json::Value, _, ()>(route, None).await.unwrap_err();
        assert_eq!(api_message(&err), "Dependabot alerts are disabled for this repository.");
    }

    #[tokio::test]
    async fn test_unauthorized_propagates() {
        let api = MockApi::start(respond).await;
        let locked = RepoHandle { client: api.client().client, repo: RepoId::new("locked", "r") };
        let err = locked.readme().await.unwrap_err();
        assert!(err.to_string().contains("/repos/locked/r/readme"), "{err:#}");
        assert!(format!("{err:#}").contains("Bad credentials"), "{err:#}");

        let err = api.handle().license().await.unwrap_err();
        assert!(err.to_string().contains("/repos/o/r/license"), "{err:#}");
    }

    #[tokio::test]
    async fn test_full_page_fetches_next() {
        let api = MockApi::start(respond).await;
        let issues = api.handle().open_issues().await.unwrap();
        assert_eq!(issues.len(), 103);
        assert_eq!(issues[102].number, 103);
        assert_eq!(
            api.requests(),
            vec![
                "/repos/o/r/issues?state=open&per_page=100&page=1".to_string(),
                "/repos/o/r/issues?state=open&per_page=100&page=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_large_readme_is_downloaded() {
        let api = MockApi::start(respond).await;
        let readme = api.handle().readme().await.unwrap();
        assert_eq!(readme.as_deref(), Some("## Installation\n## Usage\n"));
        assert_eq!(api.requests().last().map(String::as_str), Some("/raw/README.md"));
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let file = ContentFile {
            content: Some("IyBUb29sCgojIyBJbnN0YWxs\nYXRpb24K\n".to_string()),
            encoding: Some("base64".to_string()),
            download_url: None,
        };
        assert_eq!(decode_content(&file).unwrap().as_deref(), Some("# Tool\n\n## Installation\n"));
    }

    #[test]
    fn test_decode_omitted_content() {
        let file = ContentFile {
            content: Some(String::new()),
            encoding: Some("none".to_string()),
            download_url: Some("https://raw.githubusercontent.com/o/r/main/README.md".to_string()),
        };
        assert_eq!(decode_content(&file).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let file =
            ContentFile { content: Some("!!!".to_string()), encoding: None, download_url: None };
        assert!(decode_content(&file).is_err());
    }
}

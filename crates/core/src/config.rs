use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;

/// Config file read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "repospector.yml";

/// Environment variables consulted for the access token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub checks: ChecksConfig,
    pub issues: IssuesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// Override for GitHub Enterprise, e.g. `https://github.example.com/api/v3/`.
    pub api_url: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    pub readme_sections: Vec<String>,
    pub manifest_files: Vec<String>,
    pub stale_after_days: u32,
    pub resolved_keywords: Vec<String>,
    pub addressed_keywords: Vec<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            readme_sections: ["installation", "usage", "contributing", "license", "changelog"]
                .map(String::from)
                .to_vec(),
            manifest_files: [
                "package.json",
                "requirements.txt",
                "Cargo.toml",
                "pyproject.toml",
                "go.mod",
                "Gemfile",
                "pom.xml",
            ]
            .map(String::from)
            .to_vec(),
            stale_after_days: 90,
            resolved_keywords: vec!["resolved".to_string()],
            addressed_keywords: vec!["addressed".to_string()],
        }
    }
}

impl ChecksConfig {
    pub fn stale_after(&self) -> time::Duration { time::Duration::days(self.stale_after_days.into()) }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssuesConfig {
    pub create: bool,
    pub mode: IssueMode,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueMode {
    /// A single issue listing every failed check.
    #[default]
    Tracking,
    /// One issue per failed check.
    PerCheck,
}

impl std::str::FromStr for IssueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tracking" => Ok(Self::Tracking),
            "per_check" | "per-check" => Ok(Self::PerCheck),
            _ => Err(format!("Unknown issue mode '{s}', expected tracking or per_check")),
        }
    }
}

impl Config {
    /// Load the config from `path`, or from [`DEFAULT_CONFIG_FILE`] if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                path
            }
        };
        let file = BufReader::new(
            File::open(&path)
                .with_context(|| format!("Failed to open config file {}", path.display()))?,
        );
        let config = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("Failed to parse config")
    }

    /// Resolve the access token: explicit value, then environment, then config file.
    pub fn resolve_token(
        &self,
        explicit: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String> {
        let token = explicit
            .map(str::to_string)
            .or_else(|| TOKEN_ENV_VARS.iter().find_map(|&var| env(var)))
            .or_else(|| self.github.token.clone())
            .filter(|token| !token.trim().is_empty());
        match token {
            Some(token) => Ok(token),
            None => bail!(
                "No GitHub token provided; set {} or pass --token",
                TOKEN_ENV_VARS.join(" or ")
            ),
        }
    }
}

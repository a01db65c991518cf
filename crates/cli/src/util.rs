use repospector_core::{config::IssueMode, models::RepoId};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

// For argp::FromArgs
pub fn repo_id(value: &str) -> Result<RepoId, String> {
    value.parse::<RepoId>().map_err(|e| e.to_string())
}

pub fn issue_mode(value: &str) -> Result<IssueMode, String> { value.parse() }

pub fn output_format(value: &str) -> Result<OutputFormat, String> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Unknown format '{value}', expected text or json")),
    }
}

use std::path::PathBuf;

use anyhow::Result;
use argp::FromArgs;
use repospector_core::{
    analyze,
    config::{Config, IssueMode},
    file_issues,
    models::RepoId,
};
use repospector_github::GitHub;
use time::OffsetDateTime;

use crate::util::{OutputFormat, issue_mode, output_format, repo_id};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Analyze a repository and print a checklist report.
#[argp(subcommand, name = "analyze")]
pub struct Args {
    #[argp(positional, from_str_fn(repo_id))]
    /// repository as owner/name or a GitHub URL
    repo: RepoId,
    #[argp(option, short = 't')]
    /// access token (defaults to GITHUB_TOKEN or GH_TOKEN)
    token: Option<String>,
    #[argp(option, short = 'c')]
    /// config file (defaults to repospector.yml if present)
    config: Option<PathBuf>,
    #[argp(switch)]
    /// file issues for failed checks
    create_issues: bool,
    #[argp(option, from_str_fn(issue_mode))]
    /// how to file issues: tracking (one issue) or per_check
    issue_mode: Option<IssueMode>,
    #[argp(option, short = 'f', default = "OutputFormat::Text", from_str_fn(output_format))]
    /// output format: text or json
    format: OutputFormat,
}

pub async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if args.create_issues {
        config.issues.create = true;
    }
    if let Some(mode) = args.issue_mode {
        config.issues.mode = mode;
    }
    let token = config.resolve_token(args.token.as_deref(), |var| std::env::var(var).ok())?;

    let github = GitHub::new(&config.github, token)?;
    let repo = github.repo(args.repo.clone()).await?;
    tracing::info!("Analyzing {}", args.repo);
    let report = analyze(&repo, &args.repo, &config.checks, OffsetDateTime::now_utc()).await?;
    match args.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }

    if config.issues.create {
        let created = file_issues(&repo, &report, &config.issues).await?;
        if args.format == OutputFormat::Text {
            for issue in &created {
                println!("Issue created: {} ({})", issue.title, issue.html_url);
            }
        }
    }
    Ok(())
}

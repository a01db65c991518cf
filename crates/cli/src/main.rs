mod cmd;
mod util;

use argp::FromArgs;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(FromArgs, PartialEq, Debug)]
/// Check a GitHub repository for common project hygiene problems.
struct TopLevel {
    #[argp(subcommand)]
    command: SubCommand,
    #[argp(switch, short = 'v')]
    /// Log debug output.
    verbose: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argp(subcommand)]
enum SubCommand {
    Analyze(cmd::analyze::Args),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: TopLevel = argp::parse_args_or_exit(argp::DEFAULT);

    let default_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let env_filter =
        EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let result = match args.command {
        SubCommand::Analyze(args) => cmd::analyze::run(args).await,
    };
    if let Err(e) = result {
        tracing::error!("{:?}", e);
        std::process::exit(1);
    }
}

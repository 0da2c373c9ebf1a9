use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod config;
mod dispatch;
mod present;
mod transport;
mod utils;

use cmd::{AliasesArgs, AskArgs, ChatArgs, GlobalOpts};
use config::CliOverrides;

/// finassist - ask the financial tools functions in plain language
///
/// Commands:
///   finassist ask "<prompt>" [--user-id ID] [--skip-execution] [--json] [--raw] [--summarize]
///   finassist chat [--user-id ID]
///   finassist aliases [--json]
///
/// Global flags / env:
///   -v / -vv / -vvv     Increase verbosity (logs go to stderr; RUST_LOG overrides)
///   -q / --quiet        Errors only
///   -c / --config PATH  YAML or JSON config file (or FINASSIST_CONFIG)
///   --matcher TARGET    Matcher target (or FINASSIST_MATCHER)
///   --timeout SECS      Per-call timeout (or FINASSIST_TIMEOUT_SECS)
///
/// Target kinds:
///   lambda:<name|arn>          AWS Lambda, invoked request/response
///   http(s)://...              JSON POST endpoint
///   anything else              local MCP server command, spawned per call
///
/// Examples:
///   finassist ask "Show me all my monthly subscriptions"
///   finassist ask "What are my goals?" --skip-execution
///   finassist --matcher https://api.example.com/prod/match chat -u u42
#[derive(Parser, Debug)]
#[command(
    name = "finassist",
    version,
    author,
    about = "finassist - natural-language front end for the financial tools functions",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (YAML or JSON)
    #[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Matcher target (lambda:<name>, URL, or local command)
    #[arg(long = "matcher", global = true, value_name = "TARGET")]
    matcher: Option<String>,

    /// Timeout for each external call, in seconds
    #[arg(long = "timeout", global = true, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer one prompt and exit
    Ask(AskArgs),

    /// Interactive session
    Chat(ChatArgs),

    /// Show the alias table
    Aliases(AliasesArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let globals = GlobalOpts {
        config: cli.config,
        overrides: CliOverrides {
            matcher: cli.matcher,
            timeout_secs: cli.timeout,
        },
    };

    match cli.command {
        Commands::Ask(args) => cmd::execute_ask(args, &globals),
        Commands::Chat(args) => cmd::execute_chat(args, &globals),
        Commands::Aliases(args) => cmd::execute_aliases(args),
    }
}

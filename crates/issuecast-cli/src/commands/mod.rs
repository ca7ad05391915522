//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod notify;
pub mod serve;

/// Issuecast - realtime issue updates for project subscribers
#[derive(Parser)]
#[command(name = "issuecast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the websocket server
    Serve(serve::ServeArgs),

    /// Ask a running server to broadcast issue updates
    Notify(notify::NotifyArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Notify(args) => notify::execute(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_log_file_defaults_next_to_db() {
        let cli = Cli::try_parse_from(["issuecast", "serve", "--db", "data/issues.db", "--log"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.log_file(), PathBuf::from("data/serve.log"));
    }

    #[test]
    fn test_notify_requires_issues() {
        assert!(Cli::try_parse_from(["issuecast", "notify", "--workspace", "acme", "--project", "42"]).is_err());
        let cli = Cli::try_parse_from([
            "issuecast", "notify", "--workspace", "acme", "--project", "42", "issue_7", "issue_8",
        ])
        .unwrap();
        let Commands::Notify(args) = cli.command else {
            panic!("expected notify");
        };
        assert_eq!(args.issues, vec!["issue_7", "issue_8"]);
        assert_eq!(args.kind, "issue.updated");
    }
}

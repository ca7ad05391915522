//! Web server command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "ISSUECAST_PORT", default_value = "3040")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "ISSUECAST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// SQLite database holding the issues
    #[arg(long, env = "ISSUECAST_DB", default_value = ".issuecast/issuecast.db")]
    pub db: PathBuf,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (defaults to serve.log next to the database)
    #[arg(long, requires = "log")]
    pub log_file: Option<PathBuf>,
}

impl ServeArgs {
    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            self.db
                .parent()
                .map(|dir| dir.join("serve.log"))
                .unwrap_or_else(|| PathBuf::from("serve.log"))
        })
    }
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let pool = issuecast_db::init_pool(&args.db)
        .with_context(|| format!("opening database {}", args.db.display()))?;
    issuecast_db::migrations::run_migrations(&pool).context("running migrations")?;
    let pool = Arc::new(pool);

    println!();
    println!("  {} {}", "Issuecast".cyan().bold(), "Realtime Server".bold());
    println!();
    println!(
        "  {}  ws://{}:{}/ws/projects/{{project_id}}/",
        "WebSocket".green(),
        args.host,
        args.port
    );
    println!(
        "  {}     http://{}:{}/internal/notify",
        "Notify".green(),
        args.host,
        args.port
    );
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    issuecast_web::run_server(pool, &args.host, args.port).await?;

    Ok(())
}

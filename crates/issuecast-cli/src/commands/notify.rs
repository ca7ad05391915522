//! Notification command.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use issuecast_core::{EventKind, HttpNotifier, NotifyRequest};

#[derive(Args)]
pub struct NotifyArgs {
    /// Workspace slug
    #[arg(long)]
    pub workspace: String,

    /// Project id
    #[arg(long)]
    pub project: String,

    /// Issue ids to broadcast
    #[arg(required = true)]
    pub issues: Vec<String>,

    /// IANA timezone for timestamps (defaults to UTC)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Event kind
    #[arg(long, default_value = "issue.updated")]
    pub kind: String,

    /// Server URL
    #[arg(long, env = "ISSUECAST_URL", default_value = "http://127.0.0.1:3040")]
    pub url: String,
}

pub async fn execute(args: NotifyArgs) -> Result<()> {
    let mut request = NotifyRequest::new(&args.workspace, &args.project, args.issues)
        .with_kind(EventKind::new(args.kind));
    request.timezone = args.timezone;

    let notifier = HttpNotifier::with_url(&args.url);
    if !notifier.notify(&request).await {
        bail!("server at {} did not accept the notification", args.url);
    }

    println!(
        "{} {} for project {}",
        "✓".green(),
        request.event_kind,
        request.project_id.cyan()
    );
    Ok(())
}

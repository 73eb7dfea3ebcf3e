//! notify - send one notification through the configured mail route.
//!
//! Reads the service configuration from the environment, initializes the
//! process logger and hands the message to the notification dispatcher.
//! With no provider credentials the message is written to the log instead.

mod output;

use anyhow::Context;
use clap::Parser;
use notification_dispatch::{resolve_route, NotificationDispatcher, NotificationRequest};
use output::{OutputFormat, Outcome};
use service_config::ServiceConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Send a notification via Postman, SendGrid, or the log.
#[derive(Parser, Debug)]
#[command(name = "notify")]
#[command(version)]
struct Cli {
    /// Recipient address
    #[arg(long, env = "NOTIFY_TO")]
    to: String,

    /// Subject line
    #[arg(long)]
    subject: String,

    /// Message body, HTML allowed
    #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
    body: Option<String>,

    /// Read the message body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Print the route without sending
    #[arg(long)]
    dry_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

impl Cli {
    fn read_body(&self) -> anyhow::Result<String> {
        match (&self.body, &self.body_file) {
            (Some(body), _) => Ok(body.clone()),
            (None, Some(path)) => read_body_file(path),
            (None, None) => anyhow::bail!("one of --body or --body-file is required"),
        }
    }
}

fn read_body_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading body from {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_diagnostics();
    let cli = Cli::parse();

    let config = ServiceConfig::from_env().context("loading configuration")?;
    let logger = observability::init(config.log.clone()).context("initializing logger")?;
    debug!(environment = %logger.environment(), "Logger ready");

    let request = NotificationRequest::new(cli.to.clone(), cli.subject.clone(), cli.read_body()?);
    let route = resolve_route(&config.mail);

    if cli.dry_run {
        output::print_outcome(
            &Outcome {
                route,
                recipient: &request.recipient,
                sent: false,
            },
            cli.format,
        );
        return Ok(());
    }

    let dispatcher = NotificationDispatcher::from_config(&config.mail)?;
    let result = dispatcher.send(&request, logger).await;

    // The cloud sink ships on its own thread; wait for it before exiting.
    tokio::task::spawn_blocking(move || logger.flush()).await?;

    result.with_context(|| format!("sending via {route}"))?;
    output::print_outcome(
        &Outcome {
            route,
            recipient: &request.recipient,
            sent: true,
        },
        cli.format,
    );
    Ok(())
}

//! Output formatting for the CLI.

use clap::ValueEnum;
use notification_dispatch::DeliveryRoute;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Result of one invocation.
#[derive(Debug, Serialize)]
pub struct Outcome<'a> {
    pub route: DeliveryRoute,
    pub recipient: &'a str,
    pub sent: bool,
}

/// Print the outcome in the specified format.
pub fn print_outcome(outcome: &Outcome<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            let verb = match (outcome.sent, outcome.route) {
                (false, _) => "Would deliver",
                (true, DeliveryRoute::LogOnly) => "Logged",
                (true, _) => "Delivered",
            };
            println!("{} mail to {} via {}", verb, outcome.recipient, outcome.route);
        }
        OutputFormat::Json => match serde_json::to_string(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        },
    }
}

//! CLI for the hrt retrying HTTP client.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hrt_core::config;

use commands::{run_policy, run_send};

/// Top-level CLI for hrt.
#[derive(Debug, Parser)]
#[command(name = "hrt")]
#[command(about = "hrt: send HTTP requests with retries, backoff and body replay", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one request. Status and headers go to stderr, the body to stdout.
    Send(SendArgs),

    /// Print the retry policy resolved from the config file.
    Policy,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Absolute HTTP/HTTPS URL.
    pub url: String,

    /// Request method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Extra header as 'Name: value'. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Request body.
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Retries after the first attempt (overrides the config file).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Total time budget in seconds (overrides the config file).
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<u64>,

    /// Send exactly once, bypassing the retry transport.
    #[arg(long, conflicts_with_all = ["retries", "max_duration"])]
    pub no_retry: bool,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Send(args) => run_send(&cfg, &args)?,
            CliCommand::Policy => run_policy(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

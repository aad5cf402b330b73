// aws-sso-profiles - keep ~/.aws/config in sync with AWS SSO accounts

mod accounts;
mod auth;
mod aws_config;
mod cli;
mod config;
mod error;
mod models;
mod profile;
mod reconcile;

use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if args.no_color {
        colored::control::set_override(false);
    }

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    // Logs go to stderr so stdout carries only the sync report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli::execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::output::failure(&e);
            ExitCode::FAILURE
        }
    }
}

//! murmur-setup - interactive installer for a Mumble voice server

use std::process::ExitCode;

use clap::Parser;
use murmur_setup::cli::Cli;
use murmur_setup::infra::logging;
use murmur_setup::output::{OutputContext, json};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let (as_json, no_color) = (cli.json, cli.no_color);

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let message = format!("{e:#}");
            let rendered = as_json
                .then(|| json::format_error(&message, json::error_code(&e)).ok())
                .flatten();
            match rendered {
                Some(obj) => println!("{obj}"),
                None => OutputContext::new(no_color, false).error(&format!("Error: {message}")),
            }
            ExitCode::FAILURE
        }
    }
}

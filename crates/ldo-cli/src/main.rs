//! LDO CLI - Extract table rows from documents with a language model.

use clap::Parser;
use ldo_cli::commands;
use ldo_cli::logging;
use ldo_cli::{AppConfig, Cli, Command, Formatter, API_KEY_ENV, EXIT_POLICY_VIOLATION};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_POLICY_VIOLATION),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> ldo_cli::Result<bool> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?
        .with_api_key_fallback(std::env::var(API_KEY_ENV).ok());

    logging::init(&config.logging.level, cli.debug)?;

    // Flags take precedence over the [output] section
    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let formatter = Formatter::new(format, !cli.no_color && config.output.color);

    match cli.command {
        Command::Describe(args) => {
            commands::execute_describe(args, &config, &formatter)?;
            Ok(true)
        }
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await,
    }
}

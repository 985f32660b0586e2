// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bioline - WhatsApp message ingestion and conversation threading.
//!
//! This is the binary entry point.

mod dead_letters;
mod migrate;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use bioline_config::model::BiolineConfig;

/// Bioline - WhatsApp message ingestion and conversation threading.
#[derive(Parser, Debug)]
#[command(name = "bioline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Open the database, apply pending migrations, and exit.
    Migrate,
    /// Load and validate configuration, then print a summary.
    CheckConfig,
    /// Print stored dead letters as JSON lines, newest first.
    DeadLetters {
        /// Maximum number of letters to print.
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => bioline_config::load_and_validate_path(path),
        None => bioline_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            bioline_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Migrate) => migrate::run_migrate(config).await,
        Some(Commands::DeadLetters { limit }) => {
            dead_letters::run_dead_letters(config, limit).await
        }
        Some(Commands::CheckConfig) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("bioline: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_config_summary(config: &BiolineConfig) {
    println!("config OK");
    println!("  listen:     {}:{}", config.server.host, config.server.port);
    println!("  database:   {}", config.storage.database_path);
    println!(
        "  signatures: {}",
        if config.whatsapp.app_secret.is_some() {
            "verified"
        } else {
            "NOT verified (whatsapp.app_secret unset)"
        }
    );
    println!(
        "  handshake:  {}",
        if config.whatsapp.verify_token.is_some() {
            "enabled"
        } else {
            "disabled (whatsapp.verify_token unset)"
        }
    );
    println!("  api tokens: {}", config.auth.tokens.len());
}

/// Initializes the tracing subscriber with the given log level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bioline={log_level},warn")));

    // try_init: a second call (tests, repeated commands) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

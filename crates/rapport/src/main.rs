// SPDX-FileCopyrightText: 2026 Rapport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rapport - chat-transcript relationship analysis.
//!
//! This is the binary entry point for the Rapport service and its
//! offline tools.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod analyze;
mod serve;
mod token;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rapport_config::RapportConfig;

/// Rapport - chat-transcript relationship analysis.
#[derive(Parser, Debug)]
#[command(name = "rapport", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
    /// Load and validate configuration, then print the effective settings.
    CheckConfig,
    /// Analyze a transcript file offline and print the report as JSON.
    Analyze(analyze::AnalyzeArgs),
    /// Mint a bearer token signed with `auth.token_secret`.
    Token(token::TokenArgs),
}

fn load_config(path: Option<&std::path::Path>) -> Result<RapportConfig, Vec<rapport_config::ConfigError>> {
    match path {
        Some(path) => rapport_config::load_and_validate_path(path),
        None => rapport_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            rapport_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::CheckConfig) => {
            print_config_summary(&config);
            Ok(())
        }
        Some(Commands::Analyze(args)) => analyze::run_analyze(&config, args).await,
        Some(Commands::Token(args)) => token::run_token(&config, &args),
        None => {
            println!("rapport: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config_summary(config: &RapportConfig) {
    println!("rapport: config OK");
    println!("  server:    {}:{}", config.server.host, config.server.port);
    println!("  analysis:  {}", config.analysis.mode);
    println!(
        "  auth:      {}",
        if config.auth.token_secret.is_some() { "signed tokens" } else { "unconfigured" }
    );
    println!(
        "  storage:   {}",
        config.storage.database_path.as_deref().unwrap_or("disabled")
    );
}

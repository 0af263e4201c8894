mod cli;
mod commands;
mod observability;
mod output;

use std::io::ErrorKind;

use anyhow::Result;
use clap::Parser;
use octofhir_ingest::IngestConfig;
use octofhir_ingest::config::loader::load_config;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // Optional .env for local runs
    if let Err(e) = dotenvy::dotenv()
        && !matches!(&e, dotenvy::Error::Io(io_err) if io_err.kind() == ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    observability::init_tracing();

    let cli = Cli::parse();

    let cfg = match resolve_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            print_error(&e.to_string());
            std::process::exit(2);
        }
    };
    observability::apply_logging_level(&cfg.logging.level);

    if let Err(e) = run(&cli, &cfg).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// File and environment first, then command-line flags on top.
fn resolve_config(cli: &Cli) -> octofhir_ingest::Result<IngestConfig> {
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Commands::Run(args) = &cli.command {
        args.apply_to(&mut cfg);
        cfg.validate().map_err(octofhir_ingest::Error::Config)?;
    }
    tracing::debug!(
        path = ?cli.config,
        server = %cfg.server.base_url,
        backend = %cfg.storage.backend,
        "Configuration loaded"
    );
    Ok(cfg)
}

async fn run(cli: &Cli, cfg: &IngestConfig) -> Result<()> {
    match &cli.command {
        Commands::Run(_) => commands::run::run(cfg).await?,
        Commands::Schema(args) => commands::schema::schema(cfg, args.resource),
    }
    Ok(())
}

//! Command-line tool generating API metadata from decorated TypeScript
//! controllers.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-decorators [OPTIONS] [ENTRY]
//! ```
//!
//! # Examples
//!
//! Metadata as YAML on stdout:
//! ```bash
//! openapi-from-decorators ./src/server.ts
//! ```
//!
//! An OpenAPI document as JSON:
//! ```bash
//! openapi-from-decorators ./src -e openapi -f json -o openapi.json
//! ```
//!
//! Settings from a config file, with verbose logging:
//! ```bash
//! openapi-from-decorators -c generator.yaml -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_decorators::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openapi-from-decorators starting...");

    let options = cli::parse_args_from_parsed(args)?;
    cli::run(options)?;

    info!("Metadata generation completed successfully");

    Ok(())
}

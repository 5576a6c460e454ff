//! Command-line tool that extracts endpoint metadata from decorated TypeScript
//! controllers.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-decorators [OPTIONS] <CONFIG>
//! ```
//!
//! # Examples
//!
//! Write the metadata as YAML to stdout:
//! ```bash
//! openapi-from-decorators api.config.yaml
//! ```
//!
//! Write JSON to a file with debug logging:
//! ```bash
//! openapi-from-decorators api.config.json -f json -o build/metadata.json -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_decorators::cli;

fn main() -> Result<()> {
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
    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;
    Ok(())
}

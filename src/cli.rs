use crate::config::Config;
use crate::generator::MetadataGenerator;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Extract endpoint metadata from decorated TypeScript controllers
#[derive(Parser, Debug)]
#[command(name = "openapi-from-decorators")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file (.json, .yaml or .yml)
    #[arg(value_name = "CONFIG")]
    pub config_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.config_path.is_file() {
        anyhow::bail!(
            "Configuration file does not exist: {}",
            args.config_path.display()
        );
    }

    info!("Configuration: {}", args.config_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let config = Config::load(&args.config_path)
        .with_context(|| format!("Failed to load {}", args.config_path.display()))?;

    info!("Generating endpoint metadata...");
    let metadata = MetadataGenerator::new(config).generate()?;

    let method_count: usize = metadata.controllers.iter().map(|c| c.methods.len()).sum();
    if metadata.controllers.is_empty() {
        log::warn!("No controllers found");
    }

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&metadata)?,
        OutputFormat::Json => serialize_json(&metadata)?,
    };

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote metadata to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Generation complete!");
    info!("  Controllers: {}", metadata.controllers.len());
    info!("  Endpoints: {}", method_count);
    info!("  Reference types: {}", metadata.reference_types.len());
    Ok(())
}

use crate::config::GeneratorConfig;
use crate::generator::MetadataGenerator;
use crate::openapi_builder::OpenApiBuilder;
use crate::program::{Program, ProgramOptions};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Generate API metadata (or an OpenAPI document) from decorated TypeScript controllers
#[derive(Parser, Debug)]
#[command(name = "openapi-from-decorators")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Entry file whose imports are followed, or a directory to scan
    #[arg(value_name = "ENTRY")]
    pub entry: Option<PathBuf>,

    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Glob pattern of source files to ignore (repeatable)
    #[arg(short = 'i', long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Document to emit
    #[arg(short = 'e', long = "emit", value_enum)]
    pub emit: Option<EmitKind>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// OpenAPI document title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// OpenAPI document version
    #[arg(long = "api-version", value_name = "VERSION")]
    pub api_version: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML format
    #[default]
    Yaml,
    /// JSON format
    Json,
}

/// Which document to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitKind {
    /// The controllers and reference type map
    #[default]
    Metadata,
    /// An OpenAPI 3.0 document built from the metadata
    Openapi,
}

/// Settings for one run: command line flags layered over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub entry: PathBuf,
    pub ignore: Vec<String>,
    pub emit: EmitKind,
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
    pub title: Option<String>,
    pub api_version: Option<String>,
}

/// Parse command line arguments
pub fn parse_args() -> Result<RunOptions> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Merge already-parsed arguments with the config file and validate them
pub fn parse_args_from_parsed(args: CliArgs) -> Result<RunOptions> {
    debug!("Parsed arguments: {:?}", args);

    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let options = merge(args, config)?;

    if !options.entry.exists() {
        bail!("Entry point does not exist: {}", options.entry.display());
    }

    info!("Entry point: {}", options.entry.display());
    info!("Emit: {:?}", options.emit);
    info!("Output format: {:?}", options.output_format);
    if let Some(ref output) = options.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if !options.ignore.is_empty() {
        info!("Ignore patterns: {:?}", options.ignore);
    }

    Ok(options)
}

/// Flags win over config values; ignore lists are concatenated.
fn merge(args: CliArgs, config: GeneratorConfig) -> Result<RunOptions> {
    let Some(entry) = args.entry.or(config.entry_file) else {
        bail!("No entry point given; pass ENTRY or set entryFile in the config file");
    };

    let mut ignore = config.ignore;
    ignore.extend(args.ignore);

    Ok(RunOptions {
        entry,
        ignore,
        emit: args.emit.or(config.emit).unwrap_or_default(),
        output_format: args.output_format.or(config.format).unwrap_or_default(),
        output_path: args.output_path.or(config.output_file),
        title: args.title.or(config.title),
        api_version: args.api_version.or(config.version),
    })
}

/// Run the main workflow
pub fn run(options: RunOptions) -> Result<()> {
    info!("Starting metadata generation...");

    // Step 1: Load the program
    info!("Loading program from {}...", options.entry.display());
    let program = Program::load(
        &options.entry,
        &ProgramOptions {
            ignore: options.ignore.clone(),
        },
    )?;
    info!("Loaded {} source units", program.units().len());

    // Step 2: Generate metadata
    info!("Generating metadata...");
    let metadata = MetadataGenerator::new(&program).generate()?;
    let route_count: usize = metadata.controllers.iter().map(|c| c.methods.len()).sum();
    if metadata.controllers.is_empty() {
        log::warn!("No controllers found");
    }

    // Step 3: Serialize the requested document
    info!("Serializing {:?} to {:?} format...", options.emit, options.output_format);
    let content = match options.emit {
        EmitKind::Metadata => serialize(&metadata, options.output_format)?,
        EmitKind::Openapi => {
            let mut builder = OpenApiBuilder::new();
            if options.title.is_some() || options.api_version.is_some() {
                builder = builder.with_info(
                    options.title.clone().unwrap_or_else(|| "Generated API".to_string()),
                    options.api_version.clone().unwrap_or_else(|| "1.0.0".to_string()),
                    None,
                );
            }
            builder.add_metadata(&metadata);
            serialize(&builder.build(), options.output_format)?
        }
    };

    // Step 4: Output to file or stdout
    if let Some(output_path) = &options.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Source units: {}", program.units().len());
    info!("  - Controllers: {}", metadata.controllers.len());
    info!("  - Routes: {}", route_count);
    info!("  - Referenced types: {}", metadata.reference_type_map.len());

    Ok(())
}

fn serialize<T: Serialize>(doc: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("openapi-from-decorators").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = merge(args(&["src/server.ts"]), GeneratorConfig::default()).unwrap();

        assert_eq!(options.entry, PathBuf::from("src/server.ts"));
        assert_eq!(options.emit, EmitKind::Metadata);
        assert_eq!(options.output_format, OutputFormat::Yaml);
        assert!(options.ignore.is_empty());
        assert_eq!(options.output_path, None);
    }

    #[test]
    fn test_flags_override_config() {
        let config = GeneratorConfig {
            entry_file: Some(PathBuf::from("config/server.ts")),
            ignore: vec!["**/legacy/**".to_string()],
            format: Some(OutputFormat::Json),
            emit: Some(EmitKind::Openapi),
            title: Some("From config".to_string()),
            ..Default::default()
        };

        let options = merge(
            args(&["cli/server.ts", "-f", "yaml", "-i", "**/*.spec.ts", "--title", "From flags"]),
            config,
        )
        .unwrap();

        assert_eq!(options.entry, PathBuf::from("cli/server.ts"));
        assert_eq!(options.output_format, OutputFormat::Yaml);
        assert_eq!(options.emit, EmitKind::Openapi);
        assert_eq!(
            options.ignore,
            vec!["**/legacy/**".to_string(), "**/*.spec.ts".to_string()]
        );
        assert_eq!(options.title.as_deref(), Some("From flags"));
    }

    #[test]
    fn test_entry_required() {
        let err = merge(args(&[]), GeneratorConfig::default()).unwrap_err();

        assert!(err.to_string().contains("No entry point given"));
    }

    #[test]
    fn test_missing_entry_is_rejected() {
        let err = parse_args_from_parsed(args(&["/nonexistent/server.ts"])).unwrap_err();

        assert!(err.to_string().contains("Entry point does not exist"));
    }

    #[test]
    fn test_run_writes_metadata() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("petController.ts"),
            r#"
            @Route('pets')
            export class PetController {
                @Get('{id}')
                public get(id: number): string { return ''; }
            }
            "#,
        )
        .unwrap();
        let output = temp_dir.path().join("out").join("metadata.json");

        let options = parse_args_from_parsed(args(&[
            temp_dir.path().to_str().unwrap(),
            "-f",
            "json",
            "-o",
            output.to_str().unwrap(),
        ]))
        .unwrap();
        run(options).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["controllers"][0]["name"], "PetController");
        assert_eq!(value["controllers"][0]["methods"][0]["parameters"][0]["in"], "path");
    }
}

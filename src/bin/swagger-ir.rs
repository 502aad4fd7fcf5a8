//! Swagger IR CLI
//!
//! Command-line interface for compiling Swagger 2.0 documents.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use swagger_ir::{
    compile, load_config, load_document_auto, split_tags, CompileOptions, CompiledApi, SortParams,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swagger-ir")]
#[command(about = "Compile Swagger 2.0 documents into a code generation IR")]
#[command(version)]
struct Cli {
    /// Log compiler decisions (dropped services and models)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document and print its models, services and globals as JSON
    Compile {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        #[command(flatten)]
        options: OptionArgs,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the services that survive filtering
    Tags {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Flags overriding the configuration file.
#[derive(Args)]
struct OptionArgs {
    /// JSON configuration file (camelCase keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated tags to keep
    #[arg(long)]
    include_tags: Option<String>,

    /// Comma-separated tags to drop
    #[arg(long)]
    exclude_tags: Option<String>,

    /// Keep models no service references
    #[arg(long)]
    keep_unused_models: bool,

    /// Parameter count at which a parameters container is synthesized
    #[arg(long)]
    min_params_for_container: Option<usize>,

    /// Parameter ordering: asc, desc or none
    #[arg(long, value_parser = parse_sort_params)]
    sort_params: Option<SortParams>,

    /// Tag for operations that declare none
    #[arg(long)]
    default_tag: Option<String>,

    /// Lower-case the first letter of operation names
    #[arg(long)]
    camel_case: bool,
}

fn parse_sort_params(s: &str) -> Result<SortParams, String> {
    SortParams::parse(s).ok_or_else(|| format!("expected asc, desc or none, got '{}'", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            schema,
            options,
            output,
            pretty,
        } => run_compile(&schema, &options, output, pretty),
        Commands::Tags { schema, options } => run_tags(&schema, &options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays valid JSON. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    // A subscriber may already be installed
    tracing_subscriber::registry().with(fmt_layer).try_init().ok();
}

fn build_options(args: &OptionArgs) -> Result<CompileOptions, u8> {
    let mut options = match &args.config {
        Some(path) => load_config(path).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => CompileOptions::default(),
    };

    if let Some(tags) = &args.include_tags {
        options = options.include_tags(split_tags(tags));
    }
    if let Some(tags) = &args.exclude_tags {
        options = options.exclude_tags(split_tags(tags));
    }
    if args.keep_unused_models {
        options = options.ignore_unused_models(false);
    }
    if let Some(min) = args.min_params_for_container {
        options = options.min_params_for_container(min);
    }
    if let Some(sort) = args.sort_params {
        options = options.sort_params(sort);
    }
    if let Some(tag) = &args.default_tag {
        options = options.default_tag(tag.as_str());
    }
    if args.camel_case {
        options = options.camel_case(true);
    }
    Ok(options)
}

fn load_and_compile(schema_source: &str, args: &OptionArgs) -> Result<CompiledApi, u8> {
    let options = build_options(args)?;

    let document = load_document_auto(schema_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    compile(&document, &options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_compile(
    schema_source: &str,
    args: &OptionArgs,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let api = load_and_compile(schema_source, args)?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&api)
    } else {
        serde_json::to_string(&api)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_tags(schema_source: &str, args: &OptionArgs) -> Result<(), u8> {
    let api = load_and_compile(schema_source, args)?;

    if api.services.is_empty() {
        eprintln!("No services match the tag filters");
        return Ok(());
    }
    for service in api.services.values() {
        let models: HashSet<&String> = service
            .dependencies
            .iter()
            .chain(&service.error_dependencies)
            .collect();
        println!(
            "{}\t{} operations\t{} models",
            service.name,
            service.operations.len(),
            models.len()
        );
    }
    Ok(())
}

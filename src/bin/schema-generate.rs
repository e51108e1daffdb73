//! schema-generate CLI
//!
//! Generates Go declarations from one or more JSON Schema documents.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use schema_generate::{
    load_references, output, read_schema_with_options, Generator, Graph, OutputOptions,
    ParseOptions, Registry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-generate")]
#[command(about = "Generate Go structs and types from JSON Schema documents")]
#[command(version)]
struct Cli {
    /// Schema sources: file paths or URLs (http://, https://, file://)
    inputs: Vec<String>,

    /// Additional schema source (repeatable)
    #[arg(short, long = "input", value_name = "INPUT")]
    input: Vec<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Package name for the generated code
    #[arg(short, long, default_value = "main")]
    package: String,

    /// Emit optional bool/int/string/float64 fields as pointers
    #[arg(long)]
    pointer_primitives: bool,

    /// Reject schemas without a "$schema" key
    #[arg(long, alias = "schemaKeyRequired")]
    schema_key_required: bool,

    /// Log debug events to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), u8> {
    let sources: Vec<String> = cli.inputs.into_iter().chain(cli.input).collect();
    if sources.is_empty() {
        eprintln!("Error: no input schemas given");
        return Err(2);
    }

    let parse_options = ParseOptions::default().schema_key_required(cli.schema_key_required);
    let mut registry = Registry::new();
    for source in &sources {
        let schema = read_schema_with_options(source, &parse_options).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        registry.add_root(schema).map_err(|e| {
            eprintln!("Error: {}: {}", source, e);
            e.exit_code() as u8
        })?;
    }

    load_references(&mut registry);

    let generation = Generator::new(&registry).generate();
    for failure in &generation.errors {
        eprintln!("Error: {}: {}", failure.root, failure.error);
    }
    if generation.graph.roots.is_empty() {
        if let Some(failure) = generation.errors.first() {
            return Err(failure.error.exit_code() as u8);
        }
    }

    let options = OutputOptions::new(cli.package).pointer_primitives(cli.pointer_primitives);
    write_output(cli.output, &generation.graph, &options)?;

    if generation.is_ok() {
        Ok(())
    } else {
        Err(1)
    }
}

fn write_output(path: Option<PathBuf>, graph: &Graph, options: &OutputOptions) -> Result<(), u8> {
    let result = match &path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
            output(&mut BufWriter::new(file), graph, options)
        }
        None => output(&mut io::stdout().lock(), graph, options),
    };

    result.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

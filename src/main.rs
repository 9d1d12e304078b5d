use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use clap::{Parser as ClapParser, Subcommand, builder::BoolishValueParser};
use pipette::{
    Value,
    cli::{self, CliError, RunOptions},
    document_to_json, to_json, to_json_pretty,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

#[derive(ClapParser)]
#[command(name = "pipette")]
#[command(about = "pipette - Run MongoDB-style aggregation pipelines over JSON documents")]
#[command(version)]
struct Cli {
    /// Log pipeline and stage diagnostics to stderr (on top of RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline against a collection
    Run {
        /// Pipeline JSON, or a path to a .json/.yaml/.yml pipeline file
        pipeline: String,

        /// Collection file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long, env = "PIPETTE_PRETTY", value_parser = BoolishValueParser::new())]
        pretty: bool,

        /// Print one document per line instead of a JSON array
        #[arg(long)]
        jsonl: bool,
    },

    /// Validate a pipeline without running it
    Check {
        /// Pipeline JSON, or a path to a .json/.yaml/.yml pipeline file
        pipeline: String,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category or stage name (use 'pipette docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            pipeline,
            input,
            pretty,
            jsonl,
        } => run_pipeline(pipeline, input, pretty, jsonl),
        Commands::Check { pipeline } => cli::execute_check(&pipeline).map(|checked| {
            println!("Pipeline is valid ({} stages)", checked.stages.len());
            for (i, stage) in checked.stages.iter().enumerate() {
                println!("  {i}: {stage}");
            }
        }),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(log_filter(env_directives.as_deref(), verbose))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// `RUST_LOG` directives (or `warn`), with `--verbose` raising the default to debug.
fn log_filter(env_directives: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn run_pipeline(
    pipeline: String,
    input: Option<PathBuf>,
    pretty: bool,
    jsonl: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(path) => Some(
            fs::read_to_string(&path).map_err(|source| CliError::ReadFile { path, source })?,
        ),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions { pipeline, input };
    let documents = cli::execute_run(&options)?;

    if jsonl {
        for doc in &documents {
            println!("{}", document_to_json(doc));
        }
        return Ok(());
    }

    let output = Value::Array(documents.into_iter().map(Value::Object).collect());
    let json = if pretty {
        to_json_pretty(&output)
    } else {
        to_json(&output)
    };
    println!("{}", json);
    Ok(())
}

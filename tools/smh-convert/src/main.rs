//! smh-convert - mesh model converter
//!
//! Converts canonical JSON models and .smhmb binaries into .smhmb, .smhmt text
//! dumps, or JSON, optionally gzipped.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use smh_convert::convert::{encode_options, Optimization};
use smh_convert::{collect_inputs, info, load_manifest, run_sessions, OutputType, Session};

#[derive(Parser)]
#[command(name = "smh-convert")]
#[command(about = "Mesh model converter for the compact .smhmb format")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert model files or directories of model files
    Convert(ConvertArgs),

    /// Convert the models listed in a manifest
    Build {
        /// Path to convert.toml manifest
        #[arg(default_value = "convert.toml")]
        manifest: PathBuf,
    },

    /// Print statistics about a model file
    Info {
        /// Input .json or .smhmb file (optionally .gz)
        input: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input files (.json, .smhmb, optionally .gz) or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to each input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short = 't', long = "type", value_enum, default_value_t = OutputType::Binary)]
    output_type: OutputType,

    /// Encoder passes to apply; without a list every pass is applied
    #[arg(
        long,
        value_enum,
        num_args = 0..,
        value_delimiter = ',',
        require_equals = true
    )]
    optimize: Option<Vec<Optimization>>,

    /// Drop normals before writing
    #[arg(long)]
    skip_normals: bool,

    /// Gzip the output (appends .gz)
    #[arg(long)]
    compress: bool,

    /// Convert models in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Convert(args) => convert(args),
        Commands::Build { manifest } => build(&manifest),
        Commands::Info { input } => {
            let info = info::inspect(&input)?;
            print!("{}", info);
            Ok(())
        }
    }
}

fn convert(args: ConvertArgs) -> Result<()> {
    let inputs = collect_inputs(&args.inputs)?;
    if inputs.is_empty() {
        bail!("No model files to convert");
    }

    let options = encode_options(args.optimize.as_deref());
    let sessions: Vec<Session> = inputs
        .into_iter()
        .map(|input| {
            let mut session =
                Session::new(input, args.output.as_deref(), args.output_type, options);
            session.skip_normals = args.skip_normals;
            if args.compress {
                session = session.compressed();
            }
            session
        })
        .collect();

    run(&sessions, args.parallel)
}

fn build(manifest_path: &Path) -> Result<()> {
    tracing::info!("Building models from {}", manifest_path.display());
    let manifest = load_manifest(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or(Path::new(""));

    let sessions = manifest.sessions(base_dir);
    if sessions.is_empty() {
        bail!("Manifest {} lists no models", manifest_path.display());
    }

    run(&sessions, manifest.defaults.parallel)
}

fn run(sessions: &[Session], parallel: bool) -> Result<()> {
    let summary = run_sessions(sessions, parallel);
    if !summary.is_success() {
        bail!("{}", summary.failure_message());
    }

    tracing::info!("Converted {} models", summary.succeeded);
    Ok(())
}

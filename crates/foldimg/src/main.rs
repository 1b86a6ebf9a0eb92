//! Apply a filter chain declared in a JSON file to one image.

use std::path::PathBuf;

use clap::Parser;
use foldimg_io::load_config;
use foldimg_pipeline::{RasterExecutor, SourceImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Apply a configured filter chain to an image, merging compatible filters
/// into as few processing stages as possible.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path.
    input: PathBuf,

    /// Filter chain configuration (JSON).
    #[arg(short, long, value_name = "FILE")]
    chain: PathBuf,

    /// Output image path. Required unless `--plan` is given.
    #[arg(short, long, required_unless_present = "plan")]
    output: Option<PathBuf>,

    /// Print the composed stages as JSON instead of rendering.
    #[arg(long)]
    plan: bool,

    /// Execute each stage as soon as it closes, positioning later filters
    /// against the intermediate image.
    #[arg(long, conflicts_with = "plan")]
    progressive: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    ///
    /// Without this flag `RUST_LOG` is honored, defaulting to `info`. With
    /// it, the chosen level replaces `RUST_LOG`.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Filter directives for a `-v` count and the `RUST_LOG` value, if any.
fn log_directives(verbose: u8, env: Option<String>) -> String {
    match verbose {
        0 => env.unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(verbose: u8) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_directives(verbose, env)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args.chain)?;
    let chain = config.compile()?;
    let assets = config.assets();

    info!(path = %args.input.display(), "reading image");
    let image = std::fs::read(&args.input)?;

    if args.plan {
        let stages = chain.compose(&SourceImage::new(image), &assets)?;
        println!("{}", serde_json::to_string_pretty(&stages)?);
        return Ok(());
    }

    let executor = RasterExecutor::new();
    let output = if args.progressive {
        chain.apply_progressive(image, &assets, &executor)?
    } else {
        chain.apply(image, &assets, &executor)?
    };

    let path = args
        .output
        .ok_or("--output is required when rendering")?;
    std::fs::write(&path, &output)?;
    info!(path = %path.display(), bytes = output.len(), "wrote output");
    Ok(())
}

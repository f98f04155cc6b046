use anyhow::Result;
use clap::Parser;
use lecture_cutter::{Batch, Config, Dispatcher, ExternalTools, Gate, Overrides};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lecture-cutter")]
#[command(about = "Download lecture recordings and cut out the silent parts")]
struct Args {
    /// JSON batch file: {"Subject": [{"name": "...", "url": "..."}]}
    batch: PathBuf,

    /// Config file (TOML, YAML or JSON). Command line arguments take priority
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder for finished videos, one subfolder per subject
    #[arg(short, long)]
    output_folder: Option<PathBuf>,

    /// Folder for temporary files (default: system temp dir)
    #[arg(short, long)]
    temp_dir: Option<PathBuf>,

    /// Maximal number of videos to download and convert in parallel (default: 3)
    #[arg(short = 'd', long)]
    maximum_parallel_downloads: Option<usize>,

    /// Also keep the unmodified download next to the cut video. Can only
    /// switch this on; `keep_original = true` in the config file stays on
    #[arg(long)]
    keep_original: bool,

    /// Only download, skip the silence removal. Can only switch cutting
    /// off; `jump_cut = false` in the config file stays off
    #[arg(long)]
    no_jump_cut: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn init_tracing() {
    // Warnings and errors go to stderr, everything else to stdout
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let cfg = Config::load(args.config.as_deref())?;
    let settings = cfg.resolve(Overrides {
        output_folder: args.output_folder,
        temp_dir: args.temp_dir,
        max_parallel: args.maximum_parallel_downloads,
        keep_original: args.keep_original,
        no_jump_cut: args.no_jump_cut,
    })?;

    let batch = Batch::load(&args.batch)?;
    if batch.is_empty() {
        info!("Nothing to download");
    }

    let tools = Arc::new(ExternalTools::new(settings.tools.clone()));
    let dispatcher = Dispatcher::new(tools, Gate::new(settings.max_parallel), settings.options);

    let summary = dispatcher
        .run_batch(&batch, &settings.output_folder, &settings.temp_dir)
        .await;

    if let Some(path) = args.summary {
        summary.write_json(&path)?;
        info!("Run summary written to {}", path.display());
    }

    Ok(())
}

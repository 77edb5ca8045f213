use anyhow::Result;
use astroturf_lib::app::App;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,

    /// Seed override for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// CSV output path (stdout when absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the final metrics snapshot as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = App::load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }

    let mut app = App::new(config)?;
    app.run(args.ticks)?;
    app.write_report(args.output.as_deref())?;
    if let Some(path) = &args.snapshot {
        app.write_snapshot(path)?;
    }

    Ok(())
}

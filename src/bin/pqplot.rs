//! pqplot CLI binary.
//!
//! Renders handshake latency surfaces from benchmark `.npy` output.
//!
//! # Commands
//!
//! - `render` - Write per-variant and/or combined figures
//! - `inspect` - Summarize the datasets and the bounds each mode would use
//! - `config` - Print the effective configuration as TOML

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pqplot::{CompositionMode, Config, Pipeline, VERSION};

#[derive(Parser)]
#[command(name = "pqplot")]
#[command(version = VERSION)]
#[command(about = "Comparative 3D plots of TLS handshake latency", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/pqplot/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the variant .npy files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render figures
    Render {
        /// Which figures to produce
        #[arg(short, long, value_enum, default_value = "all")]
        mode: ModeArg,

        /// Output directory (default: the data directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Open the combined figure once saved
        #[arg(long)]
        preview: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize datasets and per-mode bounds without rendering
    Inspect {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One figure per variant plus a color bar
    PerVariant,
    /// All variants in one figure
    Combined,
    /// Both of the above
    All,
}

impl ModeArg {
    fn modes(self) -> Vec<CompositionMode> {
        match self {
            ModeArg::PerVariant => vec![CompositionMode::PerVariant],
            ModeArg::Combined => vec![CompositionMode::Combined],
            ModeArg::All => CompositionMode::ALL.to_vec(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command.unwrap_or(Commands::Render {
        mode: ModeArg::All,
        out_dir: None,
        preview: false,
        json: false,
    }) {
        Commands::Render {
            mode,
            out_dir,
            preview,
            json,
        } => cmd_render(config, mode, out_dir, preview, json),
        Commands::Inspect { json } => cmd_inspect(config, json),
        Commands::Config => cmd_config(&config),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_render(
    mut config: Config,
    mode: ModeArg,
    out_dir: Option<PathBuf>,
    preview: bool,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = out_dir {
        config = config.with_out_dir(dir);
    }
    if preview && config.combined.preview_command.is_none() {
        config = config.with_preview(default_viewer());
    }

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(&mode.modes())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for summary in &report.modes {
            println!(
                "{:<12} bound {:>10}  ({} variant(s))",
                summary.mode,
                summary.bound,
                summary.variants.len()
            );
        }
        for artifact in &report.artifacts {
            println!("  {}", artifact.path.display());
        }
    }

    Ok(())
}

fn cmd_inspect(config: Config, json: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let report = pipeline.inspect()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<20} {:>8} {:>12} {:>12}", "VARIANT", "SHAPE", "MIN (ms)", "MAX (ms)");
    println!("{}", "-".repeat(55));
    for ds in &report.datasets {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
        println!(
            "{:<20} {:>8} {:>12} {:>12}",
            ds.variant.to_string(),
            format!("{}x{}", ds.shape.0, ds.shape.1),
            fmt(ds.min),
            fmt(ds.max)
        );
    }
    println!();
    for summary in &report.modes {
        let variants: Vec<String> = summary.variants.iter().map(|v| v.to_string()).collect();
        println!(
            "{} bound: {} over [{}]",
            summary.mode,
            summary.bound,
            variants.join(", ")
        );
    }

    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn default_viewer() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

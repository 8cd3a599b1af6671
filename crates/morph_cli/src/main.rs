//! Morph CLI
//!
//! Inspect sheet configuration and replay scripted gesture sessions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod script;

use morph_sheet::{Collaborators, SheetConfig, UnifiedPlayerSheet};
use script::{Replay, Sample, Script};

#[derive(Parser)]
#[command(name = "morph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unified player sheet motion tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration as TOML
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file
        path: PathBuf,
    },

    /// Replay a gesture script and print one JSON frame per line
    Simulate {
        /// Gesture script (JSON)
        #[arg(short, long)]
        script: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sampling interval while time passes
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Config { output } => cmd_config(output.as_deref()),
        Commands::Check { path } => cmd_check(&path),
        Commands::Simulate {
            script,
            config,
            frame_ms,
        } => cmd_simulate(&script, config.as_deref(), frame_ms),
    }
}

fn load_config(path: Option<&Path>) -> Result<SheetConfig> {
    match path {
        Some(path) => SheetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SheetConfig::default()),
    }
}

fn cmd_config(output: Option<&Path>) -> Result<()> {
    let content = SheetConfig::default().to_toml_string()?;
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Default configuration written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    info!(
        "{} is valid ({} fps, {}x{} dp)",
        path.display(),
        config.motion.target_fps,
        config.layout.screen_width_dp,
        config.layout.screen_height_dp
    );
    Ok(())
}

fn cmd_simulate(script_path: &Path, config_path: Option<&Path>, frame_ms: u64) -> Result<()> {
    let config = load_config(config_path)?;
    let script = Script::load(script_path)?;
    info!(
        "Replaying {} steps from {}",
        script.steps.len(),
        script_path.display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async {
        let sheet = UnifiedPlayerSheet::new(config, Collaborators::noop())?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let mut replay = Replay::new(&sheet, frame_ms, |sample: &Sample<'_>| {
            serde_json::to_writer(&mut out, sample)?;
            writeln!(out)?;
            Ok(())
        });
        replay.run(&script).await?;
        sheet.wait_idle().await;
        Ok::<(), anyhow::Error>(())
    })
}

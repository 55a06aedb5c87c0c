//! Rotalog CLI
//!
//! Thin wrapper around rotalog-core for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Log stdin to ./logs/app.log, rotating at 10 MB and keeping 5 archives
//! some-server 2>&1 | rotalog pipe --dir ./logs --base app.log --size 10 --unit MB --generations 5
//!
//! # Same, rotating daily
//! some-server 2>&1 | rotalog pipe --dir ./logs --base app.log --daily
//!
//! # Use a JSON sink configuration
//! some-server 2>&1 | rotalog pipe --config sink.json
//!
//! # Force a rotation
//! rotalog rotate --dir ./logs --base app.log --size 10
//!
//! # Show the active file and archives
//! rotalog status --dir ./logs --base app.log
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rotalog_core::{
    Inventory, Level, RotationConfig, RotationOutcome, Sink, SinkConfig, SizeUnit,
};
use tokio::io::AsyncBufReadExt;

/// Rotalog - rotating log files
#[derive(Parser)]
#[command(name = "rotalog")]
#[command(version = "0.1.0")]
#[command(about = "Rotalog - leveled log files with size and date rotation")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log every line read from stdin until EOF or Ctrl+C
    Pipe {
        #[command(flatten)]
        sink: SinkArgs,

        /// Level each line is logged at
        #[arg(short, long, default_value = "info")]
        level: String,

        /// Mirror lines to stderr
        #[arg(long)]
        console: bool,
    },

    /// Force one rotation of the active file
    Rotate {
        #[command(flatten)]
        sink: SinkArgs,
    },

    /// Show the active file and its archives
    Status {
        /// Log directory (default: ~/.rotalog/logs)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Active file name
        #[arg(short, long, default_value = "rotalog.log")]
        base: String,
    },
}

/// Where the log goes and how it rotates.
#[derive(Args)]
struct SinkArgs {
    /// JSON sink configuration (overrides the other sink options)
    #[arg(long, conflicts_with_all = ["dir", "size", "daily"])]
    config: Option<PathBuf>,

    /// Log directory (default: ~/.rotalog/logs)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Active file name
    #[arg(short, long, default_value = "rotalog.log")]
    base: String,

    /// Rotate once the file reaches this many units
    #[arg(long, default_value_t = 10)]
    size: u64,

    /// Size unit: KB, MB, GB or TB
    #[arg(long, default_value = "MB")]
    unit: String,

    /// Number of archives to keep
    #[arg(short, long, default_value_t = 5)]
    generations: u32,

    /// Rotate daily instead of by size
    #[arg(long, conflicts_with = "size")]
    daily: bool,

    /// Days between rotations (recorded, rotation stays daily)
    #[arg(long, default_value_t = 1)]
    interval_days: u32,
}

impl SinkArgs {
    fn to_config(&self) -> Result<SinkConfig> {
        if let Some(path) = &self.config {
            return SinkConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()));
        }

        let dir = self.dir.clone().unwrap_or_else(default_log_dir);
        let rotation = if self.daily {
            RotationConfig::ByDate {
                dir,
                base: self.base.clone(),
                interval_days: self.interval_days,
            }
        } else {
            RotationConfig::BySize {
                dir,
                base: self.base.clone(),
                max_size: self.size,
                max_generations: self.generations,
                unit: SizeUnit::from_str(&self.unit)?,
            }
        };

        let mut config = SinkConfig::new(rotation);
        config.level = Level::All;
        config.console = false;
        Ok(config)
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default log directory (~/.rotalog/logs)
fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rotalog")
        .join("logs")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Pipe {
            sink,
            level,
            console,
        } => {
            let level = Level::from_str(&level)?;
            let mut config = sink.to_config()?;
            config.console |= console;

            let sink = Sink::from_config(&config)?;
            tracing::info!(
                path = ?sink.active_path(),
                mode = %sink.mode(),
                "piping stdin"
            );

            let stdin = tokio::io::stdin();
            let reader = tokio::io::BufReader::new(stdin);
            let mut lines = reader.lines();
            let mut count = 0u64;

            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        match line {
                            Ok(Some(text)) => {
                                sink.log(level, format_args!("{}", text));
                                count += 1;
                            }
                            // EOF - stdin closed
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to read stdin");
                                break;
                            }
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("received shutdown signal");
                        break;
                    }
                }
            }

            sink.close();
            tracing::info!(lines = count, "sink closed");
        }

        Commands::Rotate { sink } => {
            let config = sink.to_config()?;
            let sink = Sink::builder()
                .level(config.level)
                .console(config.console)
                .build();
            // An oversized file is already rotated while configuring
            let outcome = match config.apply(&sink)? {
                RotationOutcome::Rotated => RotationOutcome::Rotated,
                _ => sink.rotate_now()?,
            };
            let path = sink.active_path();
            sink.close();

            let path = path
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            match outcome {
                RotationOutcome::Rotated => println!("Rotated {}", path),
                RotationOutcome::Skipped => {
                    println!("Skipped {}: archive for this period already exists", path)
                }
                RotationOutcome::NotDue => println!("Nothing to rotate for {}", path),
            }
        }

        Commands::Status { dir, base } => {
            let dir = dir.unwrap_or_else(default_log_dir);
            let inventory = Inventory::scan(&dir, &base)
                .with_context(|| format!("scanning {}", dir.display()))?;
            print!("{}", inventory.render());
        }
    }

    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshotbot CLI - Accessibility Snapshot and Regression Bot
//!
//! Part of the gitbot-fleet ecosystem.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use snapshotbot::config::{self, LogConfig};
use snapshotbot::report::{render_diff, render_error, render_snapshot, OutputFormat};
use snapshotbot::error::Side;
use snapshotbot::snapshot::{SnapshotEnvelope, SnapshotKind};
use snapshotbot::{diff, scanner};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Accessibility snapshot and regression bot for gitbot-fleet
#[derive(Parser)]
#[command(name = "snapshotbot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML, or TOML by extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a snapshot of one HTML file
    Capture {
        /// HTML file to capture
        file: PathBuf,

        /// Snapshot kind
        #[arg(long, default_value = "structure")]
        kind: KindArg,

        /// Output format
        #[arg(long, default_value = "json")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Capture every HTML file under a directory
    Batch {
        /// Directory to walk
        dir: PathBuf,

        /// Snapshot kind
        #[arg(long, default_value = "structure")]
        kind: KindArg,

        /// Output file for the envelope array (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare two stored snapshots
    Diff {
        /// Older snapshot envelope (JSON)
        old: PathBuf,

        /// Newer snapshot envelope (JSON)
        new: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Resolve an element path against an HTML file
    Resolve {
        /// HTML file
        file: PathBuf,

        /// Element path, e.g. /html/body[1]/nav[1] or #main
        path: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to .snapshotbot/config.yml)
        path: Option<PathBuf>,
    },
}

/// Snapshot kind CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// Landmarks, headings and other structure
    Structure,
    /// Keyboard focus order
    TabOrder,
}

impl From<KindArg> for SnapshotKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Structure => SnapshotKind::Structure,
            KindArg::TabOrder => SnapshotKind::TabOrder,
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool, log: &LogConfig) {
    let filter = if verbose {
        EnvFilter::new("snapshotbot=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("snapshotbot={}", log.level)))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if log.format == "pretty" {
        builder.pretty().init();
    } else {
        builder.compact().init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    init_logging(cli.verbose, &config.log);

    match cli.command {
        Commands::Capture { file, kind, format, output } => {
            let envelope = scanner::capture_file(&file, kind.into(), &config)
                .with_context(|| format!("Failed to capture {}", file.display()))?;
            if envelope.truncated {
                eprintln!("Warning: snapshot truncated at {} records", config.scan.max_items);
            }
            write_output(&render_snapshot(&envelope, format.into()), output.as_deref())?;
        }

        Commands::Batch { dir, kind, output } => {
            let envelopes = scanner::capture_directory(&dir, kind.into(), &config)?;
            write_output(&serde_json::to_string_pretty(&envelopes)?, output.as_deref())?;
        }

        Commands::Diff { old, new, format } => {
            let format: OutputFormat = format.into();
            let result = SnapshotEnvelope::load(&old, Side::Old).and_then(|old| {
                let new = SnapshotEnvelope::load(&new, Side::New)?;
                diff::compare_scans(Some(&old), Some(&new))
            });

            match result {
                Ok(result) => {
                    println!("{}", render_diff(&result, format));
                    if !result.is_empty() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    println!("{}", render_error(&e, OutputFormat::Json));
                    std::process::exit(2);
                }
            }
        }

        Commands::Resolve { file, path } => {
            let doc = scanner::load_document(&file)?;
            match doc.resolve_in_frames(&path) {
                Some((frame_doc, node)) => {
                    let tag = frame_doc.element(node).map(|el| el.tag()).unwrap_or("");
                    if std::ptr::eq(frame_doc, &doc) {
                        println!("<{}> {}", tag, doc.path_for(node));
                    } else {
                        println!("<{}> {}", tag, path);
                    }
                }
                None => {
                    eprintln!("No element at {}", path);
                    std::process::exit(1);
                }
            }
        }

        Commands::InitConfig { path } => {
            let path = path.unwrap_or_else(config::default_config_path);
            config::write_default_config(&path)?;
            info!("Wrote default configuration");
            eprintln!("Configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Output written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

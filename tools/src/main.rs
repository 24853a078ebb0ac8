use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codec::CodecLimits;
use glob::Pattern;
use opal_tools::{format_discovery_pretty, format_packet_pretty, inspect_discovery, inspect_packet};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "opal-tools",
    version,
    about = "Opal SSC capture inspection tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a Level-0 discovery response.
    Discovery {
        /// Path to the discovery bytes.
        path: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Decode captured ComPackets.
    Decode {
        /// Path to a packet file or a directory of packets.
        path: PathBuf,
        /// Optional glob filter when decoding a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Limit the number of decoded packets.
        #[arg(long)]
        limit: Option<usize>,
        /// Maximum token nesting accepted in payloads.
        #[arg(long)]
        max_depth: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Discovery { path, format } => {
            let bytes =
                fs::read(&path).with_context(|| format!("read discovery {}", path.display()))?;
            let report = inspect_discovery(&bytes).context("parse level 0 discovery")?;
            match format {
                Format::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                Format::Pretty => print!("{}", format_discovery_pretty(&report)),
            }
        }
        Command::Decode {
            path,
            glob,
            limit,
            max_depth,
            format,
        } => {
            let mut limits = CodecLimits::default();
            if let Some(depth) = max_depth {
                limits.max_token_depth = depth;
            }
            if path.is_dir() {
                let mut entries = collect_packet_entries(&path, glob.as_deref())?;
                entries.sort();
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    if matches!(format, Format::Pretty) {
                        println!("== {} ==", entry.display());
                    }
                    decode_file(&entry, &limits, format)?;
                }
            } else {
                decode_file(&path, &limits, format)?;
            }
        }
    }
    Ok(())
}

fn decode_file(path: &Path, limits: &CodecLimits, format: Format) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("read packet {}", path.display()))?;
    let report = inspect_packet(&bytes, limits)
        .with_context(|| format!("unframe packet {}", path.display()))?;
    if let Some(error) = &report.error {
        tracing::debug!(path = %path.display(), %error, "payload did not decode");
    }
    match format {
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
        Format::Pretty => print!("{}", format_packet_pretty(&report)),
    }
    Ok(())
}

fn collect_packet_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        entries.push(path);
    }
    Ok(entries)
}

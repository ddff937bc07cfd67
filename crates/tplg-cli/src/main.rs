//! tplg-check - Offline audio topology checker
//!
//! Reads one topology binary, decodes it into a record catalog, prints the
//! decode statistics (and per-record dumps with `-v`), then runs the
//! semantic checks and summarizes the findings. Warnings never change the
//! exit code; only a fatal decode failure or unreadable input does.

mod dump;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tplg_core::{validate, Catalog, Category, Limits};

#[derive(Parser, Debug)]
#[command(name = "tplg-check")]
#[command(about = "Decode and check an audio topology binary")]
#[command(version)]
struct Args {
    /// Path to the topology binary
    #[arg(short, long)]
    input: PathBuf,

    /// Dump every decoded record
    #[arg(short, long)]
    verbose: bool,

    /// TOML file overriding the built-in validation limits
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn load_limits(path: Option<&Path>) -> Result<Limits> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read limits file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse limits file {}", path.display()))
        }
        None => Ok(Limits::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("tplg-check v{}", env!("CARGO_PKG_VERSION"));

    let limits = load_limits(args.limits.as_deref())?;

    let data = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    info!(bytes = data.len(), "decoding topology");

    let catalog = Catalog::decode(&data)
        .with_context(|| format!("failed to decode {}", args.input.display()))?;

    if args.verbose {
        print!("{}", dump::records(&catalog));
    }
    print!("{}", dump::statistics(&catalog));

    let report = validate(&catalog, &limits);
    for finding in &report.findings {
        println!("warning: {finding}");
    }
    println!(
        "checks complete: {} range, {} graph, {} id warnings, {} elements failed to decode",
        report.count(Category::Range),
        report.count(Category::Graph),
        report.count(Category::Id),
        catalog.element_errors
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // record header for an empty graph record, matching the wire layout
    fn empty_graph_record() -> Vec<u8> {
        let mut out = Vec::new();
        for v in [0x4153_6F43u32, 3, 0, 4, 36, 0, 0, 0, 0] {
            out.extend(v.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&empty_graph_record()).unwrap();
        let data = fs::read(file.path()).unwrap();
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(catalog.headers.len(), 1);
        assert!(catalog.graphs.is_empty());
    }

    #[test]
    fn test_limits_default_when_unset() {
        let limits = load_limits(None).unwrap();
        assert_eq!(limits.ssp_slot_width_max, 38);
    }

    #[test]
    fn test_limits_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ssp_slot_width_max = 32\n").unwrap();
        let limits = load_limits(Some(file.path())).unwrap();
        assert_eq!(limits.ssp_slot_width_max, 32);
    }

    #[test]
    fn test_malformed_limits_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"buffer_size = \"big\"\n").unwrap();
        assert!(load_limits(Some(file.path())).is_err());
    }
}

use std::path::PathBuf;
use std::{env, process};

use bcmh_rntxt::{BatchConverter, ConverterConfig};
use clap::Parser;
use log::LevelFilter;

/// Convert the annotated BCMH chorales to RomanText.
///
/// Without options, reads BCMH_dataset/annotated and writes
/// BCMH_dataset/rntxt relative to the current directory.
///
/// Logging is controlled with RUST_LOG; see docs for the env_logger crate.
/// If RUST_LOG is not set, the log level defaults to Info.
#[derive(Parser)]
#[command(version, about, long_about = None, verbatim_doc_comment)]
struct Cli {
    /// YAML configuration file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of annotated **kern files
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Directory for the .rntxt files, created if absent
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut log_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        log_builder.filter_level(LevelFilter::Info);
    }
    log_builder.init();

    let mut config = match &cli.config {
        Some(path) => ConverterConfig::from_yaml_file(path)?,
        None => ConverterConfig::default(),
    };
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let written = BatchConverter::new(config).run()?;
    log::info!("converted {} files", written.len());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(2);
    }
}

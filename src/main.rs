//! CLI Entry Point for sd-logger
//!
//! Bootstrap around the record logger. The volume must already be mounted; on a board
//! with an OS that means the SD card directory exists, on a workstation any directory
//! will do.
//!
//! # Usage
//!
//! Replay the reference scenario (three buffered records, one immediate):
//! ```bash
//! sd-logger demo --mount /sd
//! ```
//!
//! Settings come from `config/sd_logger.toml` (or `--config`) and `SD_LOGGER_*`
//! environment variables; flags override both.
//!
//! Append records and close:
//! ```bash
//! sd-logger append --mount /sd --file sensor.csv --header date,value "2024-01-01;10"
//! sd-logger --config config/sd_logger.toml append --immediate "2024-01-01;99"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sd_logger::config::{LoggerConfig, DEFAULT_CONFIG_PATH};
use sd_logger::{tracing_setup, HostVolume, LoggerOptions, RecordLogger};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "sd-logger")]
#[command(about = "Buffered record logger for mounted SD cards", long_about = None)]
struct Cli {
    /// Configuration file (TOML); flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write three buffered records and one immediate record
    Demo {
        /// Mount point of the volume
        #[arg(long)]
        mount: Option<PathBuf>,

        #[arg(long)]
        file: Option<String>,

        #[arg(long)]
        capacity: Option<usize>,
    },

    /// Append records to a log file, then close it
    Append {
        #[arg(long)]
        mount: Option<PathBuf>,

        #[arg(long)]
        file: Option<String>,

        #[arg(long)]
        capacity: Option<usize>,

        /// Header columns for a new file, comma separated
        #[arg(long, value_delimiter = ',')]
        header: Option<Vec<String>>,

        /// Bypass the buffer and write every record right away
        #[arg(long)]
        immediate: bool,

        /// Records to append, one line each
        #[arg(required = true)]
        records: Vec<String>,
    },
}

impl Commands {
    /// Logger options from the configuration, with this command's flags applied on top.
    fn logger_options(&self, config: &LoggerConfig) -> LoggerOptions {
        let mut options = config.storage.to_options();
        let (mount, file, capacity) = match self {
            Commands::Demo {
                mount,
                file,
                capacity,
            } => {
                if options.header_columns.is_none() {
                    options = options.with_headers(["date", "value"]);
                }
                (mount, file, capacity)
            }
            Commands::Append {
                mount,
                file,
                capacity,
                header,
                ..
            } => {
                if header.is_some() {
                    options.header_columns = header.clone();
                }
                (mount, file, capacity)
            }
        };
        if let Some(mount) = mount {
            options.mount_point = mount.clone();
        }
        if let Some(file) = file {
            options.file_name = file.clone();
        }
        if let Some(capacity) = capacity {
            options.buffer_capacity = *capacity;
        }
        options
    }
}

/// `--config` when given, otherwise the default file; a missing default file means defaults.
/// Environment overrides apply either way.
fn resolve_config(path: Option<&Path>) -> Result<LoggerConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    LoggerConfig::load_validated(path).with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    tracing_setup::init_from_config(&config).map_err(anyhow::Error::msg)?;
    info!(name = %config.application.name, "starting");

    let options = cli.command.logger_options(&config);
    match cli.command {
        Commands::Demo { .. } => run_demo(options),
        Commands::Append {
            immediate, records, ..
        } => append_records(options, &records, immediate),
    }
}

fn run_demo(options: LoggerOptions) -> Result<()> {
    let path = options.target_path();
    let mut logger = RecordLogger::with_options(HostVolume::new(), options)
        .context("opening record logger")?;

    for record in ["2024-01-01;10", "2024-01-01;20", "2024-01-01;30"] {
        logger.write_buffered(record)?;
        info!(pending = logger.pending_len(), "record buffered");
    }
    logger.write_immediate("2024-01-01;99")?;
    logger.close()?;

    println!("Wrote demo records to {}", path.display());
    Ok(())
}

fn append_records(options: LoggerOptions, records: &[String], immediate: bool) -> Result<()> {
    let mut logger = RecordLogger::with_options(HostVolume::new(), options)
        .context("opening record logger")?;

    for record in records {
        if immediate {
            logger.write_immediate(record)?;
        } else {
            logger.write_buffered(record.as_str())?;
        }
    }
    logger.close()?;

    println!(
        "Appended {} record(s) to {}",
        records.len(),
        logger.target_path().display()
    );
    Ok(())
}

mod core;
mod database;
mod decoder;
mod parsers;
mod renderer;
mod schema;
mod shared;
mod utils;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::shared::config::ExtractorConfig;
use crate::shared::constants;

#[derive(Parser)]
#[command(author, version, about = "Convert Ocarina capture data to the backend JSON schema", long_about = None)]
struct Cli {
    /// Echo debug-level logging to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    /// Directory for debug.log / error.log
    #[arg(long, global = true, default_value = ".")]
    log_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract images and videos from the sensor tables of every configured trial
    Extract {
        #[arg(short, long, default_value = constants::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Convert a gaze JSON export to gaze records
    Gaze {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, default_value = constants::DEFAULT_GAZE_OUTPUT)]
        output: PathBuf,
    },
    /// Convert RGB bounding boxes to perception records (detic:image.json)
    Perception {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, help = "Date placed on every timestamp (YYYY-MM-DD); defaults to today")]
        reference_date: Option<NaiveDate>,
    },
    /// Convert the mission log to action and step records
    Reasoning {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, help = "Date placed on every timestamp (YYYY-MM-DD); defaults to today")]
        reference_date: Option<NaiveDate>,
    },
    /// Summarize a session video and its perception file (additional_metadata.json)
    Metadata {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// One date for the whole run, so every record shares the same epoch base.
fn reference_date(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    crate::utils::logger::init(&cli.log_dir, cli.verbose);

    match cli.command {
        Commands::Extract { config } => {
            let config = match ExtractorConfig::load(&config) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Error reading config file: {}", e);
                    return Ok(());
                }
            };
            crate::core::extractor::run(&config)?;
        }
        Commands::Gaze { input, output } => {
            parsers::gaze::run(&input, &output)?;
        }
        Commands::Perception { input, output, reference_date: date } => {
            let date = reference_date(date);
            log::info!("Using reference date {}", date);
            parsers::perception::run(&input, &output, date)?;
        }
        Commands::Reasoning { input, output, reference_date: date } => {
            let date = reference_date(date);
            log::info!("Using reference date {}", date);
            parsers::reasoning::run(&input, &output, date)?;
        }
        Commands::Metadata { input, output } => {
            parsers::metadata::run(&input, &output)?;
        }
    }

    Ok(())
}

//! Command-line front end for the rainfall forecast engine.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rainfall_forecast::map::{build_map_records, load_coordinates};
use rainfall_forecast::{artifact_key, ForecastConfig, PredictionEngine};

#[derive(Parser)]
#[command(name = "rainfall")]
#[command(version)]
#[command(about = "Per-region rainfall forecasts from pre-trained LSTM models", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "RAINFALL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the historical dataset path
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Override the artifact directory
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict next year's rainfall for one region
    Predict {
        /// Region name, matched fuzzily against the dataset
        region: String,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List canonical regions and their artifact keys
    Catalog,

    /// Predict every region in a coordinates file and write map data
    Map {
        /// JSON array of {region, latitude, longitude}
        #[arg(short = 'i', long)]
        coordinates: PathBuf,

        /// Output file for the map records
        #[arg(short, long, default_value = "map_data.json")]
        output: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<ForecastConfig> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    if let Some(dataset) = &cli.dataset {
        config = config.with_dataset_path(dataset);
    }
    if let Some(artifacts) = &cli.artifacts {
        config = config.with_artifact_dir(artifacts);
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let engine = PredictionEngine::from_config(&config).context("initializing prediction engine")?;

    match cli.command {
        Commands::Predict { region, json } => match engine.predict(&region) {
            Ok(prediction) => {
                if json {
                    let response = rainfall_forecast::api::PredictionResponse::from(prediction);
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    println!("Predicted rainfall for {}: {} mm", prediction.region, prediction.value);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                if json {
                    let body = rainfall_forecast::api::ErrorBody::from(&err);
                    println!("{}", serde_json::to_string_pretty(&body)?);
                } else {
                    eprintln!("{}: {}", err.kind(), err);
                }
                Ok(ExitCode::FAILURE)
            }
        },

        Commands::Catalog => {
            for region in engine.resolver().catalog() {
                println!("{}\t{}", region, artifact_key(region));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Map { coordinates, output } => {
            let places = load_coordinates(&coordinates)
                .with_context(|| format!("reading coordinates {}", coordinates.display()))?;
            let report = build_map_records(&engine, &places);
            report
                .write_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;

            println!(
                "Wrote {} records to {} ({} regions failed)",
                report.records.len(),
                output.display(),
                report.failures.len()
            );
            for failure in &report.failures {
                eprintln!("  {}: {} ({})", failure.region, failure.message, failure.kind);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse())
}

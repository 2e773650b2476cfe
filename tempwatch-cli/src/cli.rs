use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use std::{num::NonZeroUsize, path::PathBuf};

use tempwatch_core::{
    Config, Dataset, Reading, analyze_city,
    baseline::{compare_observation, current_season},
    bench::{bench_analysis, bench_weather},
    dataset, ensure_data_at, ensure_data_exists,
    generator::DEFAULT_YEARS,
    get_weather_sync,
    stats::describe,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "tempwatch",
    version,
    about = "Temperature anomaly analysis and live weather checks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store the OpenWeather API key and dataset location.
    Configure,

    /// Generate the synthetic dataset unless one already exists.
    Generate {
        /// Number of 365-day years per city.
        #[arg(long, default_value_t = DEFAULT_YEARS)]
        years: u32,

        /// Dataset path; defaults to the configured data file.
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Rolling statistics, anomalies and seasonal profile for one city.
    Analyze {
        city: String,

        #[arg(long)]
        data: Option<PathBuf>,

        /// How many of the most recent anomalies to list.
        #[arg(long, default_value_t = 10)]
        anomalies: usize,
    },

    /// Compare the current temperature with the city's seasonal norm.
    Current {
        city: String,

        #[arg(long)]
        data: Option<PathBuf>,

        /// Overrides the configured API key.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Time sequential vs. parallel analysis and blocking vs. concurrent requests.
    Bench {
        #[arg(long)]
        data: Option<PathBuf>,

        /// Worker threads for the parallel run.
        #[arg(long)]
        workers: Option<NonZeroUsize>,

        /// Number of cities to request live weather for.
        #[arg(long, default_value_t = 5)]
        cities: usize,

        #[arg(long)]
        api_key: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        tracing::debug!(command = ?self.command, "dispatching command");

        match self.command {
            Command::Configure => configure(config)?,
            Command::Generate { years, data } => {
                let path = data.unwrap_or_else(|| config.data_file());
                if ensure_data_at(&path, years)? {
                    println!("Dataset written to {}.", path.display());
                } else {
                    println!("Dataset already exists at {}; left untouched.", path.display());
                }
            }
            Command::Analyze { city, data, anomalies } => {
                let ds = load_dataset(data, &config)?;
                let readings = city_readings(&ds, &city)?;

                let temps: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
                let analysis = analyze_city(&readings)?;

                render::print_summary(&city, describe(&temps).as_ref());
                render::print_anomalies(&analysis, anomalies);
                render::print_seasonal(&analysis.seasonal);
            }
            Command::Current { city, data, api_key } => {
                let api_key = resolve_api_key(api_key, &config)?;
                let ds = load_dataset(data, &config)?;
                let analysis = analyze_city(&city_readings(&ds, &city)?)?;

                let request_city = city.clone();
                let doc =
                    tokio::task::spawn_blocking(move || get_weather_sync(&request_city, &api_key))
                        .await
                        .context("Weather request task failed")?;

                let comparison = compare_observation(&doc, &analysis, current_season())?;
                render::print_comparison(&city, &comparison);
                render::print_document(&doc)?;
            }
            Command::Bench { data, workers, cities, api_key } => {
                let ds = load_dataset(data, &config)?;
                let workers = workers.unwrap_or_else(|| config.workers());

                let analysis = bench_analysis(&ds, workers)?;
                render::print_analysis_bench(&analysis);

                match resolve_api_key(api_key, &config) {
                    Ok(key) => {
                        let subset: Vec<String> = ds.cities().into_iter().take(cities).collect();
                        let weather = bench_weather(&subset, &key).await?;
                        render::print_weather_bench(&weather);
                    }
                    Err(e) => println!("Skipping API benchmark: {e}"),
                }
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let default_path = config.data_file();
    let data_file = Text::new("Dataset file:")
        .with_default(&default_path.display().to_string())
        .prompt()?;
    config.data_file = Some(PathBuf::from(data_file.trim()));

    let workers =
        CustomType::<usize>::new("Worker threads for parallel analysis (0 = all cores):")
            .with_default(config.workers.unwrap_or(0))
            .prompt()?;
    config.workers = (workers > 0).then_some(workers);

    config.save()?;
    println!("Configuration saved to {}.", Config::config_file_path()?.display());
    Ok(())
}

/// Load `--data`, or the configured dataset, generating the latter on first use.
fn load_dataset(data: Option<PathBuf>, config: &Config) -> anyhow::Result<Dataset> {
    let path = match data {
        Some(path) => path,
        None => {
            if ensure_data_exists(config)? {
                println!("Generated synthetic dataset at {}.", config.data_file().display());
            }
            config.data_file()
        }
    };
    dataset::load_csv(&path)
}

fn city_readings(ds: &Dataset, city: &str) -> anyhow::Result<Vec<Reading>> {
    let readings = ds.readings_for(city);
    if readings.is_empty() {
        return Err(anyhow!(
            "City '{city}' not found in dataset. Available cities: {}.",
            ds.cities().join(", ")
        ));
    }
    Ok(readings)
}

fn resolve_api_key(flag: Option<String>, config: &Config) -> anyhow::Result<String> {
    match flag {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Ok(config.api_key()?.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_parses_city_and_limits() {
        let cli =
            Cli::try_parse_from(["tempwatch", "analyze", "New York", "--anomalies", "3"]).unwrap();
        match cli.command {
            Command::Analyze { city, anomalies, data } => {
                assert_eq!(city, "New York");
                assert_eq!(anomalies, 3);
                assert!(data.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bench_rejects_zero_workers() {
        assert!(Cli::try_parse_from(["tempwatch", "bench", "--workers", "0"]).is_err());
    }

    #[test]
    fn api_key_flag_overrides_config() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_CONFIG".into());

        assert_eq!(resolve_api_key(Some("FLAG".into()), &cfg).unwrap(), "FLAG");
        assert_eq!(resolve_api_key(None, &cfg).unwrap(), "FROM_CONFIG");
        assert!(resolve_api_key(None, &Config::default()).is_err());
    }

    #[test]
    fn configured_dataset_is_generated_once_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temps.csv");
        let config = Config { data_file: Some(path.clone()), ..Config::default() };

        let first = load_dataset(None, &config).unwrap();
        assert!(first.cities().iter().any(|c| c == "Paris"));
        let written = std::fs::read(&path).unwrap();

        let second = load_dataset(None, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&path).unwrap(), written);
    }

    #[test]
    fn explicit_data_path_is_not_generated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        let err = load_dataset(Some(path.clone()), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("Dataset file not found"));
        assert!(!path.exists());
    }

    #[test]
    fn unknown_city_lists_available_ones() {
        let ds = Dataset::new(vec![Reading::new(
            "Paris",
            chrono::NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            3.0,
        )]);

        let err = city_readings(&ds, "Oslo").unwrap_err();
        assert!(err.to_string().contains("Available cities: Paris"));
    }
}

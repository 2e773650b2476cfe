//! Synthetic daily temperature data.
//!
//! Temperatures are sampled from a normal distribution centred on the
//! city's seasonal normal (see [`crate::season::SEASONAL_NORMALS`]) with a
//! standard deviation of [`TEMPERATURE_STD`].

use anyhow::Result;
use chrono::NaiveDate;
use rand::Rng;
use rand_distr::StandardNormal;
use std::path::Path;

use crate::{
    config::Config,
    dataset,
    error::GenerateError,
    model::{Dataset, Reading},
    season::{self, Season},
};

pub const DAYS_PER_YEAR: usize = 365;
pub const DEFAULT_YEARS: u32 = 10;
pub const TEMPERATURE_STD: f64 = 5.0;

/// First day of every generated series.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).expect("2010-01-01 is a valid date")
}

/// Generate `years * 365` consecutive daily readings per city.
///
/// Fails before sampling anything if a city has no seasonal normals.
pub fn generate_dataset<R: Rng + ?Sized>(
    cities: &[&str],
    years: u32,
    rng: &mut R,
) -> Result<Dataset, GenerateError> {
    let mut per_city = Vec::with_capacity(cities.len());
    for &city in cities {
        let normals = season::normals_for(city)
            .ok_or_else(|| GenerateError::UnknownCity(city.to_string()))?;

        // indexed by `Season as usize`
        let means: Vec<f64> = Season::all().iter().map(|&s| normals.mean_for(s)).collect();
        per_city.push((city, means));
    }

    let days = DAYS_PER_YEAR * years as usize;
    let mut readings = Vec::with_capacity(days * cities.len());

    for (city, means) in per_city {
        for date in epoch().iter_days().take(days) {
            let z: f64 = rng.sample(StandardNormal);
            let temperature = means[Season::of_date(date) as usize] + TEMPERATURE_STD * z;

            readings.push(Reading::new(city, date, temperature));
        }
    }

    Ok(Dataset::new(readings))
}

/// Generate the built-in dataset at the configured data file unless it already exists.
///
/// Without a configured path this is `temperature_data.csv` in the working directory.
pub fn ensure_data_exists(config: &Config) -> Result<bool> {
    ensure_data_at(&config.data_file(), DEFAULT_YEARS)
}

/// Generate and persist the built-in dataset at `path` if no file is there.
///
/// Returns `true` when a new file was written. An existing file is never touched.
pub fn ensure_data_at(path: &Path, years: u32) -> Result<bool> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "dataset already present");
        return Ok(false);
    }

    let cities = season::known_cities();
    tracing::info!(
        path = %path.display(),
        cities = cities.len(),
        years,
        "generating synthetic dataset"
    );

    let dataset = generate_dataset(&cities, years, &mut rand::thread_rng())?;
    dataset::save_csv(path, &dataset)?;

    tracing::info!(rows = dataset.len(), "synthetic dataset written");
    Ok(true)
}

//! Per-city statistical transform.
//!
//! A city's readings are sorted chronologically, annotated with trailing
//! rolling statistics, flagged as anomalous when they fall outside
//! `mean ± k·std` of their own window, and aggregated per season.

use std::collections::BTreeMap;

use crate::{
    error::AnalysisError,
    model::{AnalyzedRow, AnalyzedSeries, CityAnalysis, Reading, SeasonalStat},
    season::Season,
    stats,
};

pub const ROLLING_WINDOW: usize = 30;
pub const ANOMALY_SIGMAS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Trailing window length, in rows.
    pub window: usize,
    /// Rolling standard deviations from the rolling mean beyond which a reading is anomalous.
    pub sigmas: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self { window: ROLLING_WINDOW, sigmas: ANOMALY_SIGMAS }
    }
}

pub fn analyze_city(readings: &[Reading]) -> Result<CityAnalysis, AnalysisError> {
    analyze_city_with(readings, AnalysisParams::default())
}

pub fn analyze_city_with(
    readings: &[Reading],
    params: AnalysisParams,
) -> Result<CityAnalysis, AnalysisError> {
    let city = readings.first().map(|r| r.city.clone()).unwrap_or_default();
    validate(&city, readings)?;

    let mut sorted: Vec<&Reading> = readings.iter().collect();
    // stable: equal timestamps keep insertion order
    sorted.sort_by_key(|r| r.timestamp);

    let temps: Vec<f64> = sorted.iter().map(|r| r.temperature).collect();
    let rows = sorted
        .iter()
        .enumerate()
        .map(|(i, reading)| {
            let window = trailing_window(&temps, i, params.window);
            let (rolling_mean, rolling_std) = match window.and_then(stats::window_stats) {
                Some((mean, std)) => (Some(mean), Some(std)),
                None => (None, None),
            };
            let flagged = is_anomaly(reading.temperature, rolling_mean, rolling_std, params.sigmas);

            AnalyzedRow {
                timestamp: reading.timestamp,
                temperature: reading.temperature,
                season: reading.season(),
                rolling_mean,
                rolling_std,
                is_anomaly: flagged,
            }
        })
        .collect::<Vec<_>>();

    let seasonal = seasonal_stats(&rows);

    tracing::debug!(
        city = %city,
        rows = rows.len(),
        anomalies = rows.iter().filter(|r| r.is_anomaly).count(),
        "city analyzed"
    );

    Ok(CityAnalysis { city, series: AnalyzedSeries { rows }, seasonal })
}

fn validate(city: &str, readings: &[Reading]) -> Result<(), AnalysisError> {
    for reading in readings {
        if reading.city != city {
            return Err(AnalysisError::MixedCities {
                expected: city.to_string(),
                found: reading.city.clone(),
            });
        }
        if !reading.temperature.is_finite() {
            return Err(AnalysisError::NonFiniteTemperature {
                city: city.to_string(),
                date: reading.timestamp,
            });
        }
    }
    Ok(())
}

/// The `len` values ending at `index`, or `None` while fewer are available.
fn trailing_window(values: &[f64], index: usize, len: usize) -> Option<&[f64]> {
    if len == 0 || index + 1 < len {
        return None;
    }
    Some(&values[index + 1 - len..=index])
}

pub fn is_anomaly(temperature: f64, mean: Option<f64>, std: Option<f64>, sigmas: f64) -> bool {
    match (mean, std) {
        (Some(mean), Some(std)) => {
            temperature < mean - sigmas * std || temperature > mean + sigmas * std
        }
        _ => false,
    }
}

/// Mean and sample std per season, ordered winter, spring, summer, autumn.
pub fn seasonal_stats(rows: &[AnalyzedRow]) -> Vec<SeasonalStat> {
    let mut groups: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.season).or_default().push(row.temperature);
    }

    groups
        .into_iter()
        .filter_map(|(season, temps)| {
            Some(SeasonalStat {
                season,
                count: temps.len(),
                mean: stats::mean(&temps)?,
                std: stats::sample_std(&temps),
            })
        })
        .collect()
}

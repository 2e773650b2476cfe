//! Live temperature against the historical seasonal norm.

use anyhow::{Result, anyhow};
use chrono::Local;

use crate::{
    analysis::ANOMALY_SIGMAS,
    model::{CityAnalysis, ObservationStatus, SeasonalStat, WeatherDocument},
    season::Season,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineVerdict {
    WithinNorm,
    Anomalous,
    /// The season has too few readings for a standard deviation.
    Undetermined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineComparison {
    pub season: Season,
    pub temperature: f64,
    pub mean: f64,
    pub std: Option<f64>,
    pub verdict: BaselineVerdict,
}

impl BaselineComparison {
    /// `(lower, upper)` bounds of the norm, when defined.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let std = self.std?;
        Some((self.mean - ANOMALY_SIGMAS * std, self.mean + ANOMALY_SIGMAS * std))
    }
}

pub fn current_season() -> Season {
    Season::of_date(Local::now().date_naive())
}

pub fn seasonal_baseline(stats: &[SeasonalStat], season: Season) -> Option<&SeasonalStat> {
    stats.iter().find(|stat| stat.season == season)
}

/// Inclusive `mean ± 2·std` check.
pub fn compare_to_baseline(temperature: f64, stat: &SeasonalStat) -> BaselineVerdict {
    let Some(std) = stat.std else {
        return BaselineVerdict::Undetermined;
    };

    let lower = stat.mean - ANOMALY_SIGMAS * std;
    let upper = stat.mean + ANOMALY_SIGMAS * std;
    if (lower..=upper).contains(&temperature) {
        BaselineVerdict::WithinNorm
    } else {
        BaselineVerdict::Anomalous
    }
}

/// Compare a fetched observation with the city's baseline for `season`.
///
/// Fails with a user-facing message when the document is not a successful
/// observation or the history has no readings for that season.
pub fn compare_observation(
    doc: &WeatherDocument,
    analysis: &CityAnalysis,
    season: Season,
) -> Result<BaselineComparison> {
    match doc.status() {
        ObservationStatus::Ok => {}
        ObservationStatus::Unauthorized { message } => {
            return Err(anyhow!("OpenWeather authorization failed: {message}"));
        }
        ObservationStatus::ApiError { code, message } => {
            return Err(anyhow!("OpenWeather returned code {code}: {message}"));
        }
        ObservationStatus::TransportError { description } => {
            return Err(anyhow!("Weather request failed: {description}"));
        }
    }

    let temperature = doc
        .temperature()
        .ok_or_else(|| anyhow!("OpenWeather response has no `main.temp` field"))?;

    let stat = seasonal_baseline(&analysis.seasonal, season).ok_or_else(|| {
        anyhow!("No historical {season} readings for '{}' to compare against", analysis.city)
    })?;

    Ok(BaselineComparison {
        season,
        temperature,
        mean: stat.mean,
        std: stat.std,
        verdict: compare_to_baseline(temperature, stat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalyzedSeries;
    use serde_json::json;

    fn stat(season: Season, mean: f64, std: Option<f64>) -> SeasonalStat {
        SeasonalStat { season, count: 10, mean, std }
    }

    fn analysis() -> CityAnalysis {
        CityAnalysis {
            city: "Berlin".into(),
            series: AnalyzedSeries::default(),
            seasonal: vec![stat(Season::Winter, 0.0, Some(5.0)), stat(Season::Summer, 20.0, None)],
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let s = stat(Season::Winter, 0.0, Some(5.0));
        assert_eq!(compare_to_baseline(10.0, &s), BaselineVerdict::WithinNorm);
        assert_eq!(compare_to_baseline(-10.0, &s), BaselineVerdict::WithinNorm);
        assert_eq!(compare_to_baseline(10.5, &s), BaselineVerdict::Anomalous);
        assert_eq!(compare_to_baseline(-10.5, &s), BaselineVerdict::Anomalous);
    }

    #[test]
    fn missing_std_is_undetermined() {
        let s = stat(Season::Summer, 20.0, None);
        assert_eq!(compare_to_baseline(20.0, &s), BaselineVerdict::Undetermined);
    }

    #[test]
    fn compare_observation_uses_main_temp() {
        let doc = WeatherDocument::new(json!({"cod": 200, "main": {"temp": 12.0}}));
        let cmp = compare_observation(&doc, &analysis(), Season::Winter).unwrap();

        assert_eq!(cmp.temperature, 12.0);
        assert_eq!(cmp.verdict, BaselineVerdict::Anomalous);
        assert_eq!(cmp.bounds(), Some((-10.0, 10.0)));
    }

    #[test]
    fn compare_observation_reports_unauthorized() {
        let doc = WeatherDocument::new(json!({"cod": 401, "message": "Invalid API key"}));
        let err = compare_observation(&doc, &analysis(), Season::Winter).unwrap_err();
        assert!(err.to_string().contains("authorization failed: Invalid API key"));
    }

    #[test]
    fn compare_observation_reports_transport_error() {
        let doc = WeatherDocument::from_error("dns error");
        let err = compare_observation(&doc, &analysis(), Season::Winter).unwrap_err();
        assert!(err.to_string().contains("Weather request failed: dns error"));
    }

    #[test]
    fn compare_observation_requires_season_history() {
        let doc = WeatherDocument::new(json!({"cod": "200", "main": {"temp": 12.0}}));
        let err = compare_observation(&doc, &analysis(), Season::Autumn).unwrap_err();
        assert!(err.to_string().contains("No historical autumn readings for 'Berlin'"));
    }
}

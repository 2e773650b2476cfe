use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

use crate::season::Season;

/// One daily temperature observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub city: String,
    #[serde(deserialize_with = "crate::dataset::deserialize_date")]
    pub timestamp: NaiveDate,
    pub temperature: f64,
}

impl Reading {
    pub fn new(city: impl Into<String>, timestamp: NaiveDate, temperature: f64) -> Self {
        Self { city: city.into(), timestamp, temperature }
    }

    pub fn season(&self) -> Season {
        Season::of_date(self.timestamp)
    }
}

/// Readings for many cities, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct cities in the order they first appear.
    pub fn cities(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.readings
            .iter()
            .filter(|r| seen.insert(r.city.as_str()))
            .map(|r| r.city.clone())
            .collect()
    }

    pub fn readings_for(&self, city: &str) -> Vec<Reading> {
        self.readings.iter().filter(|r| r.city == city).cloned().collect()
    }

    /// Owned per-city copies of the readings, cities in first-seen order.
    pub fn partition_by_city(&self) -> Vec<(String, Vec<Reading>)> {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut parts: Vec<(String, Vec<Reading>)> = Vec::new();
        for reading in &self.readings {
            let slot = *slots.entry(reading.city.as_str()).or_insert_with(|| {
                parts.push((reading.city.clone(), Vec::new()));
                parts.len() - 1
            });
            parts[slot].1.push(reading.clone());
        }
        parts
    }
}

impl From<Vec<Reading>> for Dataset {
    fn from(readings: Vec<Reading>) -> Self {
        Self::new(readings)
    }
}

/// A reading annotated with its trailing-window statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedRow {
    pub timestamp: NaiveDate,
    pub temperature: f64,
    pub season: Season,
    pub rolling_mean: Option<f64>,
    pub rolling_std: Option<f64>,
    pub is_anomaly: bool,
}

/// Chronologically sorted, annotated series for one city.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzedSeries {
    pub rows: Vec<AnalyzedRow>,
}

impl AnalyzedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &AnalyzedRow> {
        self.rows.iter().filter(|row| row.is_anomaly)
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }
}

/// Temperature mean and sample standard deviation for one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalStat {
    pub season: Season,
    pub count: usize,
    pub mean: f64,
    /// `None` when the season has a single reading.
    pub std: Option<f64>,
}

/// Result of analyzing one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAnalysis {
    pub city: String,
    pub series: AnalyzedSeries,
    pub seasonal: Vec<SeasonalStat>,
}

impl CityAnalysis {
    pub fn seasonal_stat(&self, season: Season) -> Option<&SeasonalStat> {
        self.seasonal.iter().find(|stat| stat.season == season)
    }
}

/// Raw current-weather payload, passed through as decoded.
///
/// Transport and decode failures are represented by a document with a single
/// `error` field instead of the service's `cod`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherDocument(Value);

impl WeatherDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_error(description: impl Into<String>) -> Self {
        Self(json!({ "error": description.into() }))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// The `cod` field as a string; the service sends it as a number or a string.
    pub fn code(&self) -> Option<String> {
        match self.0.get("cod")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// Current temperature (`main.temp`).
    pub fn temperature(&self) -> Option<f64> {
        self.0.pointer("/main/temp").and_then(Value::as_f64)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn status(&self) -> ObservationStatus {
        if let Some(description) = self.error() {
            return ObservationStatus::TransportError { description: description.to_string() };
        }

        let message = self.message().unwrap_or_default().to_string();
        match self.code().as_deref() {
            Some("200") => ObservationStatus::Ok,
            Some("401") => ObservationStatus::Unauthorized { message },
            Some(code) => ObservationStatus::ApiError { code: code.to_string(), message },
            None => ObservationStatus::ApiError { code: "unknown".to_string(), message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationStatus {
    Ok,
    /// The service rejected the API key.
    Unauthorized { message: String },
    ApiError { code: String, message: String },
    /// The request never produced a decodable response.
    TransportError { description: String },
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::model::WeatherDocument;

use super::WeatherFetcher;

pub const CURRENT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// OpenWeatherMap current-weather client. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, CURRENT_WEATHER_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Decode the body whatever the HTTP status: an invalid key is reported
    /// by the service as a JSON payload with `cod` 401, not as a failure.
    async fn fetch_current(&self, city: &str) -> Result<WeatherDocument> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            // the URL carries the API key
            .map_err(|e| e.without_url())
            .context("Failed to send request to OpenWeather (current weather)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to read OpenWeather current response body")?;

        let value: Value = serde_json::from_str(&body).with_context(|| {
            format!(
                "Failed to parse OpenWeather current JSON (status {}): {}",
                status,
                truncate_body(&body),
            )
        })?;

        Ok(WeatherDocument::new(value))
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> WeatherDocument {
        match self.fetch_current(city).await {
            Ok(doc) => {
                tracing::debug!(city, code = ?doc.code(), "weather fetched");
                doc
            }
            Err(e) => {
                tracing::warn!(city, error = %format!("{e:#}"), "weather request failed");
                WeatherDocument::from_error(format!("{e:#}"))
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_limits_length() {
        assert_eq!(truncate_body("short"), "short");

        let long = "é".repeat(250);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}

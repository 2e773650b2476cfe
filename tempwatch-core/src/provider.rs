//! Current-weather fetching.
//!
//! [`WeatherFetcher`] is the single capability every call site goes through.
//! Orchestration decides how it is driven:
//! - [`fetch_blocking`] runs one request to completion on the calling thread.
//! - [`fetch_concurrent`] joins every request of a batch inside one task, so
//!   requests only interleave while awaiting the network. Results keep the
//!   input order.
//!
//! [`fetch_serial`] and [`get_weather_batch`] apply the two modes to a list of
//! cities against OpenWeather.
//!
//! Fetchers never fail: transport and decode errors come back as a
//! [`WeatherDocument`] carrying an `error` field.

use crate::{WeatherDocument, provider::openweather::OpenWeatherClient};
use async_trait::async_trait;
use futures::future::join_all;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> WeatherDocument;
}

/// Drive a single fetch on a private current-thread runtime, blocking the caller.
///
/// Must not be called from a thread that is already running an async runtime;
/// wrap it in `tokio::task::spawn_blocking` there.
pub fn fetch_blocking<F>(fetcher: &F, city: &str) -> WeatherDocument
where
    F: WeatherFetcher + ?Sized,
{
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(fetcher.fetch(city)),
        Err(e) => WeatherDocument::from_error(format!("Failed to start request runtime: {e}")),
    }
}

/// Fetch every city concurrently within the current task; output order equals input order.
pub async fn fetch_concurrent<F, S>(fetcher: &F, cities: &[S]) -> Vec<WeatherDocument>
where
    F: WeatherFetcher + ?Sized,
    S: AsRef<str>,
{
    join_all(cities.iter().map(|city| fetcher.fetch(city.as_ref()))).await
}

/// Blocking current-weather lookup for one city.
pub fn get_weather_sync(city: &str, api_key: &str) -> WeatherDocument {
    let client = OpenWeatherClient::new(api_key.to_owned());
    fetch_blocking(&client, city)
}

/// One blocking lookup after another, each with its own connection.
pub fn fetch_serial<S: AsRef<str>>(cities: &[S], api_key: &str) -> Vec<WeatherDocument> {
    fetch_serial_with(|| OpenWeatherClient::new(api_key.to_owned()), cities)
}

/// Blocking lookups in input order; `make_fetcher` is called once per city.
pub fn fetch_serial_with<F, M, S>(make_fetcher: M, cities: &[S]) -> Vec<WeatherDocument>
where
    F: WeatherFetcher,
    M: Fn() -> F,
    S: AsRef<str>,
{
    tracing::debug!(cities = cities.len(), "serial weather lookups started");
    cities.iter().map(|city| fetch_blocking(&make_fetcher(), city.as_ref())).collect()
}

/// Concurrent lookup of every city over one connection pool that lives for this batch.
pub async fn get_weather_batch<S: AsRef<str>>(cities: &[S], api_key: &str) -> Vec<WeatherDocument> {
    get_weather_batch_with(&OpenWeatherClient::new(api_key.to_owned()), cities).await
}

pub async fn get_weather_batch_with<S: AsRef<str>>(
    client: &OpenWeatherClient,
    cities: &[S],
) -> Vec<WeatherDocument> {
    tracing::debug!(cities = cities.len(), "weather batch started");
    fetch_concurrent(client, cities).await
}

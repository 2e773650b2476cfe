//! Wall-clock comparison of the execution strategies.

use anyhow::{Context, Result};
use std::{
    future::Future,
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use crate::{
    batch::{pool_size, run_analysis_parallel_with, run_analysis_sequential},
    error::BatchError,
    model::{Dataset, WeatherDocument},
    provider::{fetch_serial, get_weather_batch},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub label: &'static str,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBenchmark {
    pub cities: usize,
    /// Threads the parallel run actually used.
    pub workers: usize,
    pub sequential: Timing,
    pub parallel: Timing,
    /// Both strategies produced the same analyses.
    pub identical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherBenchmark {
    pub cities: usize,
    pub serial: Timing,
    pub concurrent: Timing,
    /// Documents carrying an `error` field, across both runs.
    pub failures: usize,
}

fn timed<T>(label: &'static str, f: impl FnOnce() -> T) -> (T, Timing) {
    let start = Instant::now();
    let out = f();
    (out, Timing { label, elapsed: start.elapsed() })
}

pub fn bench_analysis(
    dataset: &Dataset,
    workers: NonZeroUsize,
) -> Result<AnalysisBenchmark, BatchError> {
    let (sequential_results, sequential) =
        timed("sequential", || run_analysis_sequential(dataset));
    let (parallel_results, parallel) =
        timed("parallel", || run_analysis_parallel_with(dataset, workers));

    let sequential_results = sequential_results?;
    let parallel_results = parallel_results?;

    tracing::info!(
        sequential_ms = sequential.elapsed.as_millis() as u64,
        parallel_ms = parallel.elapsed.as_millis() as u64,
        "analysis benchmark finished"
    );

    Ok(AnalysisBenchmark {
        cities: sequential_results.len(),
        workers: pool_size(workers, sequential_results.len()),
        sequential,
        parallel,
        identical: sequential_results == parallel_results,
    })
}

/// Time a serial run of blocking lookups against one concurrent batch.
///
/// `serial` runs on the blocking pool; `concurrent` is awaited in place once
/// the serial run is done.
pub async fn bench_fetch<S, C>(
    cities: &[String],
    serial: S,
    concurrent: C,
) -> Result<WeatherBenchmark>
where
    S: FnOnce(&[String]) -> Vec<WeatherDocument> + Send + 'static,
    C: Future<Output = Vec<WeatherDocument>>,
{
    let serial_cities = cities.to_vec();
    let (serial_docs, serial) =
        tokio::task::spawn_blocking(move || timed("serial", || serial(&serial_cities)))
            .await
            .context("Serial weather benchmark task failed")?;

    let start = Instant::now();
    let concurrent_docs = concurrent.await;
    let concurrent = Timing { label: "concurrent", elapsed: start.elapsed() };

    let failures = serial_docs
        .iter()
        .chain(concurrent_docs.iter())
        .filter(|doc| doc.error().is_some())
        .count();

    Ok(WeatherBenchmark { cities: cities.len(), serial, concurrent, failures })
}

pub async fn bench_weather(cities: &[String], api_key: &str) -> Result<WeatherBenchmark> {
    let serial_key = api_key.to_owned();
    bench_fetch(
        cities,
        move |cities| fetch_serial(cities, &serial_key),
        get_weather_batch(cities, api_key),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        generator::generate_dataset,
        provider::{WeatherFetcher, fetch_concurrent, fetch_serial_with},
    };
    use async_trait::async_trait;
    use rand::{SeedableRng, rngs::StdRng};
    use serde_json::json;

    #[test]
    fn analysis_strategies_agree() {
        let ds = generate_dataset(&["Paris", "Mumbai", "Sydney"], 1, &mut StdRng::seed_from_u64(3))
            .unwrap();

        let bench = bench_analysis(&ds, NonZeroUsize::new(2).unwrap()).unwrap();
        assert_eq!(bench.cities, 3);
        assert_eq!(bench.workers, 2);
        assert!(bench.identical);
        assert_eq!(bench.sequential.label, "sequential");
        assert_eq!(bench.parallel.label, "parallel");
    }

    #[test]
    fn analysis_reports_threads_actually_used() {
        let ds = generate_dataset(&["Paris", "Mumbai"], 1, &mut StdRng::seed_from_u64(5)).unwrap();

        let bench = bench_analysis(&ds, NonZeroUsize::new(16).unwrap()).unwrap();
        assert_eq!(bench.cities, 2);
        assert_eq!(bench.workers, 2);
    }

    #[derive(Debug)]
    struct SlowFetcher;

    #[async_trait]
    impl WeatherFetcher for SlowFetcher {
        async fn fetch(&self, city: &str) -> WeatherDocument {
            tokio::time::sleep(Duration::from_millis(40)).await;
            if city == "Nowhere" {
                WeatherDocument::from_error("unreachable")
            } else {
                WeatherDocument::new(json!({ "cod": 200, "name": city }))
            }
        }
    }

    #[tokio::test]
    async fn concurrent_batch_beats_serial_loop() {
        let cities: Vec<String> = ["Paris", "Nowhere", "Tokyo", "Cairo"].map(String::from).to_vec();

        let bench = bench_fetch(
            &cities,
            |cities| fetch_serial_with(|| SlowFetcher, cities),
            fetch_concurrent(&SlowFetcher, &cities),
        )
        .await
        .unwrap();

        assert_eq!(bench.cities, 4);
        assert_eq!(bench.failures, 2);
        assert!(bench.serial.elapsed >= Duration::from_millis(160));
        assert!(bench.concurrent.elapsed < bench.serial.elapsed);
    }
}

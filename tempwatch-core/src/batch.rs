//! Batch analysis over every city of a dataset.
//!
//! Two interchangeable strategies:
//! - [`run_analysis_sequential`] analyzes cities one at a time in first-seen
//!   order and stops at the first failure.
//! - [`run_analysis_parallel`] fans cities out to a pool of worker threads.
//!   Each task owns a copy of its city's readings and results come back over
//!   a channel tagged with the dispatch index and city. Every task runs to
//!   completion before a failure is reported, so unlike the sequential
//!   strategy a failing city does not stop the others from being analyzed.
//!   No partial results are returned in either case.

use std::{
    num::NonZeroUsize,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use crate::{
    analysis::analyze_city,
    error::BatchError,
    model::{CityAnalysis, Dataset, Reading},
};

/// Per-city analyses in city dispatch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    analyses: Vec<CityAnalysis>,
}

impl BatchResults {
    pub fn get(&self, city: &str) -> Option<&CityAnalysis> {
        self.analyses.iter().find(|a| a.city == city)
    }

    pub fn cities(&self) -> Vec<&str> {
        self.analyses.iter().map(|a| a.city.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CityAnalysis> {
        self.analyses.iter()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn into_vec(self) -> Vec<CityAnalysis> {
        self.analyses
    }
}

impl IntoIterator for BatchResults {
    type Item = CityAnalysis;
    type IntoIter = std::vec::IntoIter<CityAnalysis>;

    fn into_iter(self) -> Self::IntoIter {
        self.analyses.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResults {
    type Item = &'a CityAnalysis;
    type IntoIter = std::slice::Iter<'a, CityAnalysis>;

    fn into_iter(self) -> Self::IntoIter {
        self.analyses.iter()
    }
}

pub fn run_analysis_sequential(dataset: &Dataset) -> Result<BatchResults, BatchError> {
    let partitions = dataset.partition_by_city();
    tracing::info!(cities = partitions.len(), "sequential analysis started");

    let mut analyses = Vec::with_capacity(partitions.len());
    for (city, readings) in partitions {
        let analysis =
            analyze_city(&readings).map_err(|source| BatchError::Analysis { city, source })?;
        analyses.push(analysis);
    }

    tracing::info!(cities = analyses.len(), "sequential analysis finished");
    Ok(BatchResults { analyses })
}

/// Host parallelism, or a single worker when it cannot be determined.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

pub fn run_analysis_parallel(dataset: &Dataset) -> Result<BatchResults, BatchError> {
    run_analysis_parallel_with(dataset, default_workers())
}

/// Threads a parallel run over `cities` cities uses with at most `workers`.
pub fn pool_size(workers: NonZeroUsize, cities: usize) -> usize {
    workers.get().min(cities)
}

struct Task<T> {
    index: usize,
    city: String,
    input: T,
}

#[derive(Debug)]
struct Outcome<R> {
    index: usize,
    city: String,
    result: R,
}

/// Analyze every city on a pool of at most `workers` threads.
///
/// The pool lives for the duration of this call and is joined on every path.
/// On failure, the error of the lowest-indexed failing city is returned.
pub fn run_analysis_parallel_with(
    dataset: &Dataset,
    workers: NonZeroUsize,
) -> Result<BatchResults, BatchError> {
    let partitions = dataset.partition_by_city();
    if partitions.is_empty() {
        return Ok(BatchResults::default());
    }

    tracing::info!(
        cities = partitions.len(),
        workers = pool_size(workers, partitions.len()),
        "parallel analysis started"
    );

    let outcomes = fan_out(partitions, workers, |readings: &Vec<Reading>| analyze_city(readings))?;

    let mut analyses = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome.result {
            Ok(analysis) => analyses.push(analysis),
            Err(source) => {
                tracing::warn!(city = %outcome.city, error = %source, "parallel analysis failed");
                return Err(BatchError::Analysis { city: outcome.city, source });
            }
        }
    }

    tracing::info!(cities = analyses.len(), "parallel analysis finished");
    Ok(BatchResults { analyses })
}

/// Run `job` over every keyed input on scoped worker threads.
///
/// Inputs are dealt round-robin onto one queue per worker. Outcomes come back
/// sorted by input index. Every worker is joined before returning; if any
/// panicked, the lowest-numbered one is reported.
fn fan_out<T, R, J>(
    inputs: Vec<(String, T)>,
    workers: NonZeroUsize,
    job: J,
) -> Result<Vec<Outcome<R>>, BatchError>
where
    T: Send,
    R: Send,
    J: Fn(&T) -> R + Sync,
{
    let expected = inputs.len();
    let size = pool_size(workers, expected);
    if size == 0 {
        return Ok(Vec::new());
    }

    let (result_tx, result_rx) = mpsc::channel::<Outcome<R>>();
    let job = &job;

    let (mut outcomes, panicked) = thread::scope(|scope| {
        let mut queues = Vec::with_capacity(size);
        let mut handles = Vec::with_capacity(size);

        for worker in 0..size {
            let (task_tx, task_rx) = mpsc::channel::<Task<T>>();
            let result_tx = result_tx.clone();
            handles.push(scope.spawn(move || run_worker(worker, task_rx, result_tx, job)));
            queues.push(task_tx);
        }
        drop(result_tx);

        for (index, (city, input)) in inputs.into_iter().enumerate() {
            // a closed queue means that worker panicked; reported after join
            let _ = queues[index % size].send(Task { index, city, input });
        }
        drop(queues);

        let outcomes: Vec<Outcome<R>> = result_rx.iter().collect();
        // join all of them: an unjoined panicked thread makes the scope itself panic
        let panicked: Vec<usize> = handles
            .into_iter()
            .enumerate()
            .filter_map(|(worker, handle)| handle.join().is_err().then_some(worker))
            .collect();

        (outcomes, panicked)
    });

    if let Some(&worker) = panicked.first() {
        tracing::error!(panicked = ?panicked, "analysis workers panicked");
        return Err(BatchError::WorkerPanicked { worker });
    }
    if outcomes.len() != expected {
        return Err(BatchError::Incomplete { expected, received: outcomes.len() });
    }

    outcomes.sort_by_key(|o| o.index);
    Ok(outcomes)
}

fn run_worker<T, R, J>(worker: usize, tasks: Receiver<Task<T>>, results: Sender<Outcome<R>>, job: &J)
where
    J: Fn(&T) -> R,
{
    for task in tasks {
        tracing::debug!(worker, city = %task.city, "analyzing city");

        let result = job(&task.input);
        let outcome = Outcome { index: task.index, city: task.city, result };
        if results.send(outcome).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn dataset(cities: &[&str], days: u64) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let mut readings = Vec::new();
        for (c, city) in cities.iter().enumerate() {
            for d in 0..days {
                let t = (c as f64) * 3.0 + ((d * 7 + c as u64) % 11) as f64;
                readings.push(Reading::new(*city, start + Days::new(d), t));
            }
        }
        Dataset::new(readings)
    }

    #[test]
    fn sequential_keeps_first_seen_order() {
        let ds = dataset(&["Sydney", "Cairo", "Paris"], 40);
        let results = run_analysis_sequential(&ds).unwrap();

        assert_eq!(results.cities(), vec!["Sydney", "Cairo", "Paris"]);
        assert_eq!(results.get("Cairo").unwrap().series.len(), 40);
        assert!(results.get("Tokyo").is_none());
    }

    #[test]
    fn parallel_matches_sequential_for_any_pool_size() {
        let ds = dataset(&["Sydney", "Cairo", "Paris", "Tokyo", "Dubai"], 75);
        let sequential = run_analysis_sequential(&ds).unwrap();

        for workers in [1, 2, 3, 16] {
            let parallel =
                run_analysis_parallel_with(&ds, NonZeroUsize::new(workers).unwrap()).unwrap();
            assert_eq!(parallel, sequential, "mismatch with {workers} workers");
        }
    }

    #[test]
    fn empty_dataset_yields_empty_results() {
        let ds = Dataset::default();
        assert!(run_analysis_sequential(&ds).unwrap().is_empty());
        assert!(run_analysis_parallel(&ds).unwrap().is_empty());
    }

    #[test]
    fn sequential_surfaces_first_failure() {
        let mut readings = dataset(&["Sydney", "Cairo", "Paris"], 5).into_readings();
        for r in readings.iter_mut().filter(|r| r.city != "Sydney") {
            r.temperature = f64::INFINITY;
        }

        let err = run_analysis_sequential(&Dataset::new(readings)).unwrap_err();
        assert!(matches!(err, BatchError::Analysis { ref city, .. } if city == "Cairo"));
    }

    #[test]
    fn parallel_fails_whole_batch() {
        let mut readings = dataset(&["Sydney", "Cairo", "Paris"], 5).into_readings();
        for r in readings.iter_mut().filter(|r| r.city != "Sydney") {
            r.temperature = f64::NAN;
        }

        let err = run_analysis_parallel_with(&Dataset::new(readings), NonZeroUsize::new(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, BatchError::Analysis { ref city, .. } if city == "Cairo"));
        assert!(err.to_string().contains("Analysis failed for city 'Cairo'"));
    }

    #[test]
    fn every_panicked_worker_is_joined_and_reported() {
        let inputs: Vec<(String, u32)> = (0..6).map(|i| (format!("city-{i}"), i)).collect();

        let err = fan_out(inputs, NonZeroUsize::new(3).unwrap(), |&i: &u32| {
            if i % 3 != 0 {
                panic!("worker blew up on {i}");
            }
            i
        })
        .unwrap_err();

        // workers 1 and 2 both panic; the lowest is reported
        assert!(matches!(err, BatchError::WorkerPanicked { worker: 1 }));
    }

    #[test]
    fn fan_out_returns_outcomes_in_input_order() {
        let inputs: Vec<(String, u32)> = (0..7).map(|i| (format!("city-{i}"), i)).collect();

        let outcomes = fan_out(inputs, NonZeroUsize::new(3).unwrap(), |&i: &u32| i * 10).unwrap();

        let results: Vec<u32> = outcomes.iter().map(|o| o.result).collect();
        assert_eq!(results, [0, 10, 20, 30, 40, 50, 60]);
        assert_eq!(outcomes[4].city, "city-4");
    }

    #[test]
    fn pool_never_exceeds_city_count() {
        let eight = NonZeroUsize::new(8).unwrap();
        assert_eq!(pool_size(eight, 3), 3);
        assert_eq!(pool_size(eight, 20), 8);
        assert_eq!(pool_size(eight, 0), 0);
    }

    #[test]
    fn default_workers_is_positive() {
        assert!(default_workers().get() >= 1);
    }
}

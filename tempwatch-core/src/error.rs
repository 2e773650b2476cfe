use chrono::NaiveDate;

/// Errors produced by the synthetic data generator.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(
        "Unknown city '{0}': no seasonal normals are defined for it.\n\
         Hint: use one of the built-in cities (see `season::known_cities`)."
    )]
    UnknownCity(String),
}

/// Errors produced while analyzing a single city.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnalysisError {
    #[error("Readings for more than one city passed to the analyzer: '{expected}' and '{found}'")]
    MixedCities { expected: String, found: String },

    #[error("Non-finite temperature for '{city}' on {date}")]
    NonFiniteTemperature { city: String, date: NaiveDate },
}

/// Errors produced by the batch runner.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Analysis failed for city '{city}': {source}")]
    Analysis {
        city: String,
        #[source]
        source: AnalysisError,
    },

    #[error("Analysis worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("Batch incomplete: expected {expected} results, received {received}")]
    Incomplete { expected: usize, received: usize },
}

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs, io, path::Path};
use tempfile::NamedTempFile;

use crate::{
    model::{Dataset, Reading},
    season::Season,
};

/// File name used when no data file is configured.
pub const DEFAULT_DATA_FILE: &str = "temperature_data.csv";

#[derive(Debug, Serialize)]
struct PersistedRow<'a> {
    city: &'a str,
    timestamp: NaiveDate,
    temperature: f64,
    season: Season,
}

/// Load a dataset from a CSV file with `city,timestamp,temperature` columns.
///
/// Extra columns (such as `season`) are ignored.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(anyhow!(
            "Dataset file not found: {}.\n\
             Hint: run `tempwatch generate` to create a synthetic dataset.",
            path.display()
        ));
    }

    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;

    read_csv(file).with_context(|| format!("Failed to load dataset file: {}", path.display()))
}

pub fn read_csv<R: io::Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut readings = Vec::new();
    for record in rdr.deserialize::<Reading>() {
        let reading = record.context("Malformed dataset row")?;
        readings.push(reading);
    }

    tracing::debug!(rows = readings.len(), "dataset loaded");
    Ok(Dataset::new(readings))
}

/// Write the dataset with a derived `season` column, creating parent directories as needed.
///
/// The rows go to a temporary file next to `path` that is renamed into place
/// once complete, so a failed write never leaves a truncated dataset behind.
pub fn save_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    write_atomically(path, |file| write_csv(file, dataset))
        .with_context(|| format!("Failed to write dataset file: {}", path.display()))
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> Result<()>,
{
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all().context("Failed to flush temporary dataset file")?;
    tmp.persist(path).map_err(|e| e.error).context("Failed to move dataset into place")?;
    Ok(())
}

pub fn write_csv<W: io::Write>(writer: W, dataset: &Dataset) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for reading in dataset.readings() {
        wtr.serialize(PersistedRow {
            city: &reading.city,
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            season: reading.season(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Parse an ISO-8601 date, tolerating a trailing time of day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date()))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

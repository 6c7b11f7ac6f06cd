//! Dataset acquisition.
//!
//! Fetches the benchmark JSON from a local path or an http(s) URL, and derives the
//! reference snapshot and the date labels the view works with.

use crate::model::{Dataset, Snapshot};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("dataset is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("unexpected dataset layout: {0}")]
    Shape(String),
    #[error("reference date {0} is not present in the dataset")]
    UnknownReferenceDate(String),
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    File(PathBuf),
    Url(String),
}

impl DataLocation {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DataLocation::Url(s.to_string())
        } else {
            DataLocation::File(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for DataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataLocation::File(p) => write!(f, "{}", p.display()),
            DataLocation::Url(u) => f.write_str(u),
        }
    }
}

/// Everything the view needs from the loader, produced once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub reference_date: String,
    pub reference: Snapshot,
    /// All dates in dataset order; the x-axis labels of the time-series view.
    pub dates: Vec<String>,
}

impl LoadedData {
    /// Pick the reference snapshot: the requested date, else the date with the most
    /// algorithm records (later dates win ties). Returns `Ok(None)` for an empty dataset.
    pub fn prepare(
        dataset: Dataset,
        reference_date: Option<&str>,
    ) -> Result<Option<Self>, LoadError> {
        if dataset.is_empty() {
            return Ok(None);
        }
        let reference_date = match reference_date {
            Some(d) => {
                if dataset.get(d).is_none() {
                    return Err(LoadError::UnknownReferenceDate(d.to_string()));
                }
                d.to_string()
            }
            None => {
                let mut best: Option<(&str, usize)> = None;
                for (date, snap) in dataset.iter() {
                    let n = snap.algorithm_count();
                    if best.map_or(true, |(_, b)| n >= b) {
                        best = Some((date, n));
                    }
                }
                match best {
                    Some((d, _)) => d.to_string(),
                    None => return Ok(None),
                }
            }
        };
        let reference = dataset.get(&reference_date).cloned().unwrap_or_default();
        let dates = dataset.dates().map(str::to_string).collect();
        debug!(reference_date = %reference_date, "selected reference snapshot");
        Ok(Some(Self {
            dataset,
            reference_date,
            reference,
            dates,
        }))
    }

    /// Date shown when the form has not picked one yet: the latest date.
    pub fn default_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }
}

/// Parse raw benchmark JSON: an object of date -> object of records.
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let Value::Object(dates) = root else {
        return Err(LoadError::Shape("top level must be an object keyed by date".into()));
    };
    let mut entries = Vec::with_capacity(dates.len());
    for (date, records) in dates {
        match records {
            Value::Object(m) => entries.push((date, Snapshot(m))),
            other => {
                return Err(LoadError::Shape(format!(
                    "entry for {date} must be an object, found {}",
                    json_kind(&other)
                )))
            }
        }
    }
    Ok(Dataset::new(entries))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch and parse the dataset.
pub async fn fetch_dataset(location: &DataLocation, timeout: Duration) -> Result<Dataset, LoadError> {
    let bytes = match location {
        DataLocation::File(path) => tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?,
        DataLocation::Url(url) => {
            let http_err = |source: reqwest::Error| LoadError::Http {
                url: url.clone(),
                source,
            };
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(format!("kem-mem-view/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(http_err)?;
            let resp = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(http_err)?;
            resp.bytes().await.map_err(http_err)?.to_vec()
        }
    };
    let dataset = parse_dataset(&bytes)?;
    info!(source = %location, dates = dataset.len(), "dataset loaded");
    Ok(dataset)
}

/// Fetch, parse and prepare in one step.
pub async fn load(
    location: &DataLocation,
    timeout: Duration,
    reference_date: Option<&str>,
) -> Result<Option<LoadedData>, LoadError> {
    let dataset = fetch_dataset(location, timeout).await?;
    LoadedData::prepare(dataset, reference_date)
}

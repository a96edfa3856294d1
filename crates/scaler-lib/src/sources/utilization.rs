//! CPU utilization sources

use super::UtilizationSource;
use crate::error::SourceError;
use crate::models::UtilizationSample;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Reads utilization from a JSON document of `{ "<id>": <percent> | null }`
///
/// The file is re-read on every call so an external poller can keep it fresh.
/// Ids that are absent or `null` had no data point and report 0.
#[derive(Debug, Clone)]
pub struct FileUtilizationSource {
    path: PathBuf,
}

impl FileUtilizationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UtilizationSource for FileUtilizationSource {
    async fn utilization(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<UtilizationSample>, SourceError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let readings: HashMap<String, Option<f64>> =
            serde_json::from_str(&content).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(samples_for(resource_ids, |id| readings.get(id).copied().flatten()))
    }
}

/// Serves a fixed set of readings
#[derive(Debug, Clone, Default)]
pub struct StaticUtilizationSource {
    readings: HashMap<String, f64>,
}

impl StaticUtilizationSource {
    pub fn new(readings: HashMap<String, f64>) -> Self {
        Self { readings }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            readings: pairs.into_iter().map(|(id, v)| (id.into(), v)).collect(),
        }
    }

    /// Every id this source has a reading for, sorted
    pub fn resource_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.readings.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl UtilizationSource for StaticUtilizationSource {
    async fn utilization(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<UtilizationSample>, SourceError> {
        Ok(samples_for(resource_ids, |id| self.readings.get(id).copied()))
    }
}

fn samples_for<F>(resource_ids: &[String], lookup: F) -> Vec<UtilizationSample>
where
    F: Fn(&str) -> Option<f64>,
{
    resource_ids
        .iter()
        .map(|id| {
            let cpu = lookup(id).unwrap_or_else(|| {
                debug!(resource_id = %id, "No utilization data point, reporting 0");
                0.0
            });
            debug!(resource_id = %id, cpu_percent = cpu, "Utilization sample");
            UtilizationSample::new(id.clone(), cpu)
        })
        .collect()
}

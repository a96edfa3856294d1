//! Fleet capacity controllers

use super::FleetController;
use crate::error::{CapacityError, FleetError};
use crate::models::FleetCapacity;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

type FleetTable = BTreeMap<String, FleetCapacity>;

/// Fleet state kept in a JSON file of `{ "<fleet>": {current, min, max} }`
///
/// Writes go to a sibling temp file that is renamed over the state file, so a
/// capacity update is either fully applied or not at all.
#[derive(Debug)]
pub struct FileFleet {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileFleet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    async fn load(&self) -> Result<FleetTable, FleetError> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            FleetError::Unavailable(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            FleetError::Unavailable(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    async fn store(&self, table: &FleetTable) -> Result<(), FleetError> {
        let content = serde_json::to_string_pretty(table)
            .map_err(|e| FleetError::Unavailable(format!("failed to encode fleet state: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(|e| {
            FleetError::Unavailable(format!("failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            FleetError::Unavailable(format!("failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl FleetController for FileFleet {
    async fn read(&self, fleet: &str) -> Result<FleetCapacity, FleetError> {
        let _guard = self.lock.read().await;
        let table = self.load().await?;
        let capacity = table
            .get(fleet)
            .copied()
            .ok_or_else(|| FleetError::NotFound(fleet.to_string()))?;
        capacity.validate()?;
        Ok(capacity)
    }

    async fn write(
        &self,
        fleet: &str,
        desired: u32,
        honor_cooldown: bool,
    ) -> Result<(), FleetError> {
        let _guard = self.lock.write().await;
        let mut table = self.load().await?;
        let capacity = table
            .get_mut(fleet)
            .ok_or_else(|| FleetError::NotFound(fleet.to_string()))?;

        check_desired(capacity, desired)?;
        let previous = capacity.current;
        capacity.current = desired;

        self.store(&table).await?;
        info!(
            fleet = %fleet,
            previous,
            desired,
            honor_cooldown,
            path = %self.path.display(),
            "Fleet capacity updated"
        );
        Ok(())
    }
}

/// A capacity write observed by [`InMemoryFleet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetWrite {
    pub fleet: String,
    pub desired: u32,
    pub honor_cooldown: bool,
}

/// Fleet controller held entirely in memory, recording every write
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    fleets: RwLock<FleetTable>,
    writes: RwLock<Vec<FleetWrite>>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fleet(mut self, name: impl Into<String>, capacity: FleetCapacity) -> Self {
        self.fleets.get_mut().insert(name.into(), capacity);
        self
    }

    /// Current capacity of a fleet, if it exists
    pub async fn capacity(&self, name: &str) -> Option<FleetCapacity> {
        self.fleets.read().await.get(name).copied()
    }

    /// Every write accepted so far, oldest first
    pub async fn writes(&self) -> Vec<FleetWrite> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl FleetController for InMemoryFleet {
    async fn read(&self, fleet: &str) -> Result<FleetCapacity, FleetError> {
        self.fleets
            .read()
            .await
            .get(fleet)
            .copied()
            .ok_or_else(|| FleetError::NotFound(fleet.to_string()))
    }

    async fn write(
        &self,
        fleet: &str,
        desired: u32,
        honor_cooldown: bool,
    ) -> Result<(), FleetError> {
        let mut fleets = self.fleets.write().await;
        let capacity = fleets
            .get_mut(fleet)
            .ok_or_else(|| FleetError::NotFound(fleet.to_string()))?;

        check_desired(capacity, desired)?;
        capacity.current = desired;

        self.writes.write().await.push(FleetWrite {
            fleet: fleet.to_string(),
            desired,
            honor_cooldown,
        });
        debug!(fleet = %fleet, desired, "In-memory fleet capacity updated");
        Ok(())
    }
}

fn check_desired(capacity: &FleetCapacity, desired: u32) -> Result<(), CapacityError> {
    if capacity.contains(desired) {
        Ok(())
    } else {
        Err(CapacityError::InvalidBounds {
            min: capacity.min,
            current: desired,
            max: capacity.max,
        })
    }
}

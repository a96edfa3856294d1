//! External collaborators of the scaling engine
//!
//! The engine reads log blobs, reads fleet CPU utilization, and reads/writes
//! fleet capacity through the traits below. Local implementations back each
//! trait with the filesystem:
//! - a directory of log files stands in for an object-storage bucket
//! - a JSON document maps resource ids to recent CPU percentages
//! - a JSON state file holds named fleets and their capacity limits

mod blob;
mod fleet;
mod utilization;


pub use blob::{DirectoryBlobSource, PathBlobSource, DEFAULT_MAX_BLOBS};
pub use fleet::{FileFleet, FleetWrite, InMemoryFleet};
pub use utilization::{FileUtilizationSource, StaticUtilizationSource};

use crate::error::{FleetError, SourceError};
use crate::models::{FleetCapacity, UtilizationSample};

pub use async_trait::async_trait;

/// Supplier of raw log text
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Fetch every blob of the current batch, in evaluation order
    async fn fetch(&self) -> Result<Vec<String>, SourceError>;
}

/// Supplier of per-resource CPU utilization
#[async_trait]
pub trait UtilizationSource: Send + Sync {
    /// Most recent average CPU percent for each requested resource
    ///
    /// Resources without a data point in the sampling window report 0.
    async fn utilization(
        &self,
        resource_ids: &[String],
    ) -> Result<Vec<UtilizationSample>, SourceError>;
}

/// Fleet manager that owns capacity limits
#[async_trait]
pub trait FleetController: Send + Sync {
    /// Read the current capacity limits of a fleet
    async fn read(&self, fleet: &str) -> Result<FleetCapacity, FleetError>;

    /// Set a new desired capacity
    async fn write(&self, fleet: &str, desired: u32, honor_cooldown: bool)
        -> Result<(), FleetError>;
}

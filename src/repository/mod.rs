//! Persistence layer.
//!
//! The pipeline only needs [`BusinessStore`]: a lookup for an existing
//! business and a write. [`persist_records`] applies the lookup-before-write
//! discipline to a batch; [`DieselBusinessStore`] implements the contract on
//! SQLite through Diesel.

pub mod diesel_business;
pub mod models;
pub mod pool;
pub mod util;

pub use diesel_business::DieselBusinessStore;
pub use pool::{DbError, DbPool};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::BusinessRecord;

/// Errors from the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<diesel::result::Error> for PersistenceError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// A business as stored, with its storage identity.
#[derive(Debug, Clone)]
pub struct StoredBusiness {
    pub id: String,
    pub slug: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub record: BusinessRecord,
}

/// Result of a single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { id: String },
    /// An equivalent business was already stored; nothing was written.
    Skipped { existing_id: String },
}

/// Backing store contract used by the pipeline.
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Exact name match, or a business whose address contains
    /// `address_prefix` and whose name contains the first word of `name`.
    async fn find_existing(
        &self,
        name: &str,
        address_prefix: &str,
    ) -> Result<Option<StoredBusiness>, PersistenceError>;

    /// Store `record` unless an identical name and address already exist.
    async fn upsert(&self, record: &BusinessRecord) -> Result<UpsertOutcome, PersistenceError>;
}

/// Counts from a batch persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PersistReport {
    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}

/// Persist a batch, skipping anything `find_existing` already knows.
///
/// A failing record is logged and counted; the rest of the batch continues.
pub async fn persist_records(
    store: &dyn BusinessStore,
    records: &[BusinessRecord],
) -> PersistReport {
    let mut report = PersistReport::default();

    for record in records {
        match persist_one(store, record).await {
            Ok(UpsertOutcome::Created { id }) => {
                debug!("Created {} ({})", record.name, id);
                report.created += 1;
            }
            Ok(UpsertOutcome::Skipped { existing_id }) => {
                debug!("Skipping duplicate: {} (matches {})", record.name, existing_id);
                report.skipped += 1;
            }
            Err(e) => {
                warn!("Failed to save {}: {}", record.name, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Persisted batch: {} created, {} skipped, {} failed",
        report.created, report.skipped, report.failed
    );
    report
}

async fn persist_one(
    store: &dyn BusinessStore,
    record: &BusinessRecord,
) -> Result<UpsertOutcome, PersistenceError> {
    if let Some(existing) = store
        .find_existing(&record.name, record.address_prefix())
        .await?
    {
        return Ok(UpsertOutcome::Skipped {
            existing_id: existing.id,
        });
    }
    store.upsert(record).await
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

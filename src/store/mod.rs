mod memory;
pub mod persisted;
mod redis_actor;

pub use memory::InMemoryEventStore;
pub use persisted::to_stored_record;
pub use redis_actor::{RedisStoreActor, RedisStoreHandle};

use crate::error::{Error, NotifierResult};
use crate::events::{CanonicalEvent, Normalizer, RawRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A stored document together with its storage-assigned key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub data: RawRecord,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, data: RawRecord) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Source of stored event documents. Records may use any historical shape.
#[async_trait]
pub trait EventStoreReader: Send + Sync {
    async fn fetch_records(&self) -> NotifierResult<Vec<StoredRecord>>;
}

/// Sink for published events, already translated to the persisted shape
#[async_trait]
pub trait EventStoreWriter: Send + Sync {
    async fn write_record(&self, id: &str, record: RawRecord) -> NotifierResult<()>;
}

/// Normalize a snapshot of stored records.
///
/// Records that cannot be identified are dropped and logged so a single bad
/// document never hides the rest of the timeline.
pub fn normalize_records(normalizer: &Normalizer, records: &[StoredRecord]) -> Vec<CanonicalEvent> {
    records
        .iter()
        .filter_map(|record| {
            let id_hint = Some(record.id.as_str()).filter(|id| !id.trim().is_empty());
            match normalizer.normalize(&record.data, id_hint) {
                Ok(event) => Some(event),
                Err(Error::MissingIdentifier) => {
                    warn!("Discarding event record without identifier");
                    None
                }
                Err(e) => {
                    warn!("Discarding event record: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Read every record from the store and normalize it
pub async fn load_events(
    reader: &dyn EventStoreReader,
    normalizer: &Normalizer,
) -> NotifierResult<Vec<CanonicalEvent>> {
    let records = reader.fetch_records().await?;
    Ok(normalize_records(normalizer, &records))
}

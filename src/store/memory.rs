use super::{EventStoreReader, EventStoreWriter, StoredRecord};
use crate::error::NotifierResult;
use crate::events::RawRecord;
use async_trait::async_trait;
use tokio::sync::watch;

/// In-memory event store with a live feed of the whole record set
#[derive(Debug)]
pub struct InMemoryEventStore {
    records: watch::Sender<Vec<StoredRecord>>,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with documents in older shapes
    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        let (records, _) = watch::channel(records);
        Self { records }
    }

    /// Receive the full record set after every write
    pub fn subscribe(&self) -> watch::Receiver<Vec<StoredRecord>> {
        self.records.subscribe()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStoreReader for InMemoryEventStore {
    async fn fetch_records(&self) -> NotifierResult<Vec<StoredRecord>> {
        Ok(self.records.borrow().clone())
    }
}

#[async_trait]
impl EventStoreWriter for InMemoryEventStore {
    async fn write_record(&self, id: &str, record: RawRecord) -> NotifierResult<()> {
        self.records.send_modify(|records| {
            match records.iter_mut().find(|stored| stored.id == id) {
                Some(stored) => stored.data = record,
                None => records.push(StoredRecord::new(id, record)),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(title: &str) -> RawRecord {
        json!({ "title": title }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_write_inserts_then_replaces() {
        let store = InMemoryEventStore::new();
        assert!(store.is_empty());

        store.write_record("a", data("first")).await.unwrap();
        store.write_record("b", data("second")).await.unwrap();
        store.write_record("a", data("replaced")).await.unwrap();

        let records = store.fetch_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].data["title"], "replaced");
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let store = InMemoryEventStore::new();
        let mut feed = store.subscribe();

        store.write_record("a", data("live")).await.unwrap();

        feed.changed().await.unwrap();
        let snapshot = feed.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].data["title"], "live");
    }
}

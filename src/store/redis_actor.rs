use super::{EventStoreReader, EventStoreWriter, StoredRecord};
use crate::config::Config;
use crate::error::{storage_error, NotifierResult};
use crate::events::RawRecord;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The Redis actor that owns the connection and serves store commands
pub struct RedisStoreActor {
    client: RedisClient,
    events_key: String,
    connection: Option<MultiplexedConnection>,
    command_rx: mpsc::Receiver<RedisStoreCommand>,
}

/// Commands that can be sent to the Redis actor
pub enum RedisStoreCommand {
    FetchRecords(mpsc::Sender<NotifierResult<Vec<StoredRecord>>>),
    WriteRecord(String, RawRecord, mpsc::Sender<NotifierResult<()>>),
    Shutdown,
}

/// Handle for communicating with the Redis actor
#[derive(Clone)]
pub struct RedisStoreHandle {
    command_tx: mpsc::Sender<RedisStoreCommand>,
}

impl RedisStoreHandle {
    /// A handle with no actor behind it; every request fails with a storage error
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> NotifierResult<()> {
        let _ = self.command_tx.send(RedisStoreCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl EventStoreReader for RedisStoreHandle {
    async fn fetch_records(&self) -> NotifierResult<Vec<StoredRecord>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(RedisStoreCommand::FetchRecords(response_tx))
            .await
            .map_err(|e| storage_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| storage_error("Response channel closed"))?
    }
}

#[async_trait]
impl EventStoreWriter for RedisStoreHandle {
    async fn write_record(&self, id: &str, record: RawRecord) -> NotifierResult<()> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(RedisStoreCommand::WriteRecord(id.to_string(), record, response_tx))
            .await
            .map_err(|e| storage_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| storage_error("Response channel closed"))?
    }
}

impl RedisStoreActor {
    /// Create a new actor and return its handle
    pub fn new(config: &Config) -> NotifierResult<(Self, RedisStoreHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        let client = RedisClient::open(config.redis_url.as_str())
            .map_err(|e| storage_error(&format!("Failed to create Redis client: {}", e)))?;

        let actor = Self {
            client,
            events_key: config.events_key.clone(),
            connection: None,
            command_rx,
        };

        Ok((actor, RedisStoreHandle { command_tx }))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis store actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RedisStoreCommand::FetchRecords(response_tx) => {
                    let result = self.fetch_records_from_redis().await;
                    let _ = response_tx.send(result).await;
                }
                RedisStoreCommand::WriteRecord(id, record, response_tx) => {
                    let result = self.write_record_to_redis(&id, record).await;
                    let _ = response_tx.send(result).await;
                }
                RedisStoreCommand::Shutdown => {
                    info!("Redis store actor shutting down");
                    break;
                }
            }
        }

        info!("Redis store actor shut down");
    }

    /// Get a redis connection, reusing the previous one
    async fn get_redis_connection(&mut self) -> NotifierResult<MultiplexedConnection> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| storage_error(&format!("Failed to connect to Redis: {}", e)))?;
        self.connection = Some(connection.clone());
        Ok(connection)
    }

    /// Read every event document from the events hash
    async fn fetch_records_from_redis(&mut self) -> NotifierResult<Vec<StoredRecord>> {
        let mut redis_conn = self.get_redis_connection().await?;

        let entries: BTreeMap<String, String> = redis_conn
            .hgetall(&self.events_key)
            .await
            .map_err(|e| storage_error(&format!("Failed to read events from Redis: {}", e)))?;

        debug!("Read {} event documents from Redis", entries.len());
        Ok(decode_entries(entries))
    }

    /// Store one event document under its identifier
    async fn write_record_to_redis(&mut self, id: &str, record: RawRecord) -> NotifierResult<()> {
        let mut redis_conn = self.get_redis_connection().await?;

        let record_json = serde_json::to_string(&record)
            .map_err(|e| storage_error(&format!("Failed to serialize event: {}", e)))?;

        () = redis_conn
            .hset(&self.events_key, id, record_json)
            .await
            .map_err(|e| storage_error(&format!("Failed to save event to Redis: {}", e)))?;

        info!("Stored event {} in Redis", id);
        Ok(())
    }
}

/// Decode hash entries; documents that are not JSON objects are skipped
fn decode_entries(entries: BTreeMap<String, String>) -> Vec<StoredRecord> {
    entries
        .into_iter()
        .filter_map(|(id, json)| match serde_json::from_str::<RawRecord>(&json) {
            Ok(data) => Some(StoredRecord::new(id, data)),
            Err(e) => {
                warn!("Skipping unreadable event document {}: {}", id, e);
                None
            }
        })
        .collect()
}

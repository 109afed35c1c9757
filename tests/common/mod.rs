#![allow(dead_code)]

use async_trait::async_trait;
use campus_notifier::draft::{
    DraftGenerator, GenerationError, GenerationRequest, PipelineSettings, RetryPolicy,
};
use campus_notifier::error::{storage_error, NotifierResult};
use campus_notifier::events::{PriorityScale, RawRecord};
use campus_notifier::store::{EventStoreWriter, InMemoryEventStore};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Turn a `json!` object into a raw record
pub fn record(value: Value) -> RawRecord {
    value.as_object().cloned().expect("test record must be an object")
}

/// A reply shaped like the Gemini output
pub fn generated_draft(title: &str) -> RawRecord {
    record(json!({
        "title_ai": title,
        "summary_ai": "Hands-on session for beginners",
        "description_ai": "Bring a laptop with Python installed.",
        "department_tags": ["CS", "IT"],
        "event_type": "workshop",
        "priority": "important",
        "venue": "Lab 2",
        "start_time": "2025-02-01T10:00:00",
        "end_time": "2025-02-01T12:00:00"
    }))
}

pub fn unavailable() -> Result<RawRecord, GenerationError> {
    Err(GenerationError::Unavailable("503 model overloaded".into()))
}

pub fn settings(local_fallback: bool) -> PipelineSettings {
    PipelineSettings {
        priorities: PriorityScale::default(),
        local_fallback,
        retry: RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(5),
            backoff_factor: 1.5,
        },
    }
}

/// Generator answering from a fixed script and recording every request
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<RawRecord, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicU32,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<RawRecord, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DraftGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawRecord, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Permanent("script exhausted".into())))
    }
}

/// Generator that blocks until released, for observing the in-flight state
#[derive(Default)]
pub struct GatedGenerator {
    pub started: Notify,
    pub release: Notify,
    calls: AtomicU32,
}

impl GatedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DraftGenerator for GatedGenerator {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawRecord, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(generated_draft(&request.title))
    }
}

/// Writer that fails a set number of times before delegating to memory
pub struct FlakyWriter {
    failures_left: AtomicU32,
    pub store: InMemoryEventStore,
}

impl FlakyWriter {
    pub fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicU32::new(failures),
            store: InMemoryEventStore::new(),
        })
    }
}

#[async_trait]
impl EventStoreWriter for FlakyWriter {
    async fn write_record(&self, id: &str, record: RawRecord) -> NotifierResult<()> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(storage_error("connection reset"));
        }
        self.store.write_record(id, record).await
    }
}

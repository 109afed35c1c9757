use super::generator::{generate_with_retry, DraftGenerator, GenerationError};
use super::pipeline::{
    Completion, DraftEdit, DraftPipeline, DraftSnapshot, GenerationTicket, PipelineSettings,
    PublishReceipt,
};
use crate::error::{other_error, Error, NotifierResult};
use crate::events::{CanonicalEvent, RawRecord};
use crate::store::EventStoreWriter;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A draft ready for preview
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPreview {
    pub draft: CanonicalEvent,
    /// Set when generation failed and the draft was built locally
    pub fallback_reason: Option<String>,
}

type Responder<T> = mpsc::Sender<NotifierResult<T>>;

/// Commands that can be sent to the draft actor
pub enum DraftCommand {
    Submit {
        title: String,
        raw_text: String,
        response_tx: Responder<DraftPreview>,
    },
    RequestRefinement(Responder<()>),
    CancelRefinement(Responder<()>),
    SubmitFeedback {
        feedback: String,
        response_tx: Responder<DraftPreview>,
    },
    Edit(DraftEdit, Responder<bool>),
    Publish {
        actor_id: String,
        response_tx: Responder<PublishReceipt>,
    },
    Abandon(Responder<bool>),
    Snapshot(mpsc::Sender<DraftSnapshot>),
    Shutdown,
}

/// The generation currently running on behalf of a caller
struct InFlight {
    epoch: u64,
    cancel: CancellationToken,
    response_tx: Responder<DraftPreview>,
}

/// Owns one draft pipeline and runs its generations in the background
pub struct DraftActor {
    pipeline: DraftPipeline,
    generator: Arc<dyn DraftGenerator>,
    writer: Arc<dyn EventStoreWriter>,
    command_rx: mpsc::Receiver<DraftCommand>,
    outcome_tx: mpsc::Sender<(u64, Result<RawRecord, GenerationError>)>,
    outcome_rx: mpsc::Receiver<(u64, Result<RawRecord, GenerationError>)>,
    in_flight: Option<InFlight>,
    shutdown: CancellationToken,
}

/// Handle for communicating with the draft actor
#[derive(Clone)]
pub struct DraftActorHandle {
    command_tx: mpsc::Sender<DraftCommand>,
}

impl DraftActorHandle {
    async fn request<T>(&self, build: impl FnOnce(Responder<T>) -> DraftCommand) -> NotifierResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| other_error(&format!("Draft actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Draft response channel closed"))?
    }

    pub async fn submit(&self, title: &str, raw_text: &str) -> NotifierResult<DraftPreview> {
        self.request(|response_tx| DraftCommand::Submit {
            title: title.to_string(),
            raw_text: raw_text.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn request_refinement(&self) -> NotifierResult<()> {
        self.request(DraftCommand::RequestRefinement).await
    }

    pub async fn cancel_refinement(&self) -> NotifierResult<()> {
        self.request(DraftCommand::CancelRefinement).await
    }

    pub async fn submit_feedback(&self, feedback: &str) -> NotifierResult<DraftPreview> {
        self.request(|response_tx| DraftCommand::SubmitFeedback {
            feedback: feedback.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn edit(&self, edit: DraftEdit) -> NotifierResult<bool> {
        self.request(|response_tx| DraftCommand::Edit(edit, response_tx)).await
    }

    pub async fn publish(&self, actor_id: &str) -> NotifierResult<PublishReceipt> {
        self.request(|response_tx| DraftCommand::Publish {
            actor_id: actor_id.to_string(),
            response_tx,
        })
        .await
    }

    pub async fn abandon(&self) -> NotifierResult<bool> {
        self.request(DraftCommand::Abandon).await
    }

    pub async fn snapshot(&self) -> NotifierResult<DraftSnapshot> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(DraftCommand::Snapshot(response_tx))
            .await
            .map_err(|e| other_error(&format!("Draft actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Draft response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> NotifierResult<()> {
        let _ = self.command_tx.send(DraftCommand::Shutdown).await;
        Ok(())
    }
}

impl DraftActor {
    /// Create a new actor and return its handle
    pub fn new(
        generator: Arc<dyn DraftGenerator>,
        writer: Arc<dyn EventStoreWriter>,
        settings: PipelineSettings,
    ) -> (Self, DraftActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);

        let actor = Self {
            pipeline: DraftPipeline::new(settings),
            generator,
            writer,
            command_rx,
            outcome_tx,
            outcome_rx,
            in_flight: None,
            shutdown: CancellationToken::new(),
        };

        (actor, DraftActorHandle { command_tx })
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Draft actor started with {} generator", self.generator.name());

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(DraftCommand::Shutdown) | None => {
                        info!("Draft actor shutting down");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some((epoch, outcome)) = self.outcome_rx.recv() => {
                    self.finish_generation(epoch, outcome).await;
                }
            }
        }

        self.shutdown.cancel();
        if let Some(in_flight) = self.in_flight.take() {
            let _ = in_flight.response_tx.send(Err(Error::DraftAbandoned)).await;
        }

        info!("Draft actor shut down");
    }

    async fn handle_command(&mut self, cmd: DraftCommand) {
        match cmd {
            DraftCommand::Submit {
                title,
                raw_text,
                response_tx,
            } => match self.pipeline.submit(&title, &raw_text) {
                Ok(ticket) => self.start_generation(ticket, response_tx),
                Err(e) => {
                    let _ = response_tx.send(Err(e)).await;
                }
            },
            DraftCommand::RequestRefinement(response_tx) => {
                let _ = response_tx.send(self.pipeline.request_refinement()).await;
            }
            DraftCommand::CancelRefinement(response_tx) => {
                let _ = response_tx.send(self.pipeline.cancel_refinement()).await;
            }
            DraftCommand::SubmitFeedback {
                feedback,
                response_tx,
            } => match self.pipeline.submit_feedback(&feedback) {
                Ok(ticket) => self.start_generation(ticket, response_tx),
                Err(e) => {
                    let _ = response_tx.send(Err(e)).await;
                }
            },
            DraftCommand::Edit(edit, response_tx) => {
                let _ = response_tx.send(self.pipeline.edit(edit)).await;
            }
            DraftCommand::Publish {
                actor_id,
                response_tx,
            } => {
                let result = self.publish(&actor_id).await;
                let _ = response_tx.send(result).await;
            }
            DraftCommand::Abandon(response_tx) => {
                if let Some(in_flight) = self.in_flight.take() {
                    debug!("Cancelling generation for abandoned draft (epoch {})", in_flight.epoch);
                    in_flight.cancel.cancel();
                    let _ = in_flight.response_tx.send(Err(Error::DraftAbandoned)).await;
                }
                let _ = response_tx.send(Ok(self.pipeline.abandon())).await;
            }
            DraftCommand::Snapshot(response_tx) => {
                let _ = response_tx.send(self.pipeline.snapshot()).await;
            }
            DraftCommand::Shutdown => {}
        }
    }

    /// Run the generation for `ticket` in its own task
    fn start_generation(&mut self, ticket: GenerationTicket, response_tx: Responder<DraftPreview>) {
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let generator = Arc::clone(&self.generator);
        let policy = self.pipeline.settings().retry.clone();
        let outcome_tx = self.outcome_tx.clone();
        let GenerationTicket { epoch, request } = ticket;

        debug!("Starting draft generation (epoch {})", epoch);
        tokio::spawn(async move {
            let outcome = generate_with_retry(generator.as_ref(), &request, &policy, &token).await;
            let _ = outcome_tx.send((epoch, outcome)).await;
        });

        self.in_flight = Some(InFlight {
            epoch,
            cancel,
            response_tx,
        });
    }

    async fn finish_generation(&mut self, epoch: u64, outcome: Result<RawRecord, GenerationError>) {
        let response_tx = match self.in_flight.take() {
            Some(in_flight) if in_flight.epoch == epoch => Some(in_flight.response_tx),
            other => {
                self.in_flight = other;
                None
            }
        };

        let result = match self.pipeline.complete(epoch, outcome) {
            Ok(Completion::Stale) => {
                debug!("Ignoring generation result for discarded draft (epoch {})", epoch);
                return;
            }
            Ok(Completion::Generated) => self.preview(None),
            Ok(Completion::Fallback(reason)) => {
                warn!("Draft generation failed, showing local draft: {}", reason);
                self.preview(Some(reason))
            }
            Err(e) => {
                warn!("Draft generation failed: {}", e);
                Err(e)
            }
        };

        if let Some(response_tx) = response_tx {
            let _ = response_tx.send(result).await;
        }
    }

    fn preview(&self, fallback_reason: Option<String>) -> NotifierResult<DraftPreview> {
        let draft = self
            .pipeline
            .draft()
            .cloned()
            .ok_or_else(|| other_error("Generated draft missing from pipeline"))?;
        Ok(DraftPreview {
            draft,
            fallback_reason,
        })
    }

    /// Write the previewed draft; the draft is kept when the write fails
    async fn publish(&mut self, actor_id: &str) -> NotifierResult<PublishReceipt> {
        let now = Utc::now();
        let (id, record) = self.pipeline.publish_payload(actor_id, now)?;

        if let Err(e) = self.writer.write_record(&id, record).await {
            warn!("Failed to publish event {}: {}", id, e);
            return Err(e);
        }

        let receipt = PublishReceipt {
            id,
            published_by: actor_id.trim().to_string(),
            published_at: now,
        };
        self.pipeline.mark_published(receipt.clone())?;
        info!("Published event {} by {}", receipt.id, receipt.published_by);

        Ok(receipt)
    }
}

use super::actor::{DraftActor, DraftActorHandle, DraftPreview};
use super::generator::DraftGenerator;
use super::pipeline::{DraftEdit, DraftSnapshot, PipelineSettings, PublishReceipt};
use crate::error::NotifierResult;
use crate::session::Session;
use crate::store::EventStoreWriter;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for one admin's draft session
#[derive(Clone)]
pub struct DraftHandle {
    actor_handle: DraftActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl DraftHandle {
    /// Create a new DraftHandle and spawn the actor
    pub fn new(
        generator: Arc<dyn DraftGenerator>,
        writer: Arc<dyn EventStoreWriter>,
        settings: PipelineSettings,
    ) -> Self {
        let (mut actor, handle) = DraftActor::new(generator, writer, settings);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Start a draft; resolves once the generation has finished
    pub async fn submit(&self, title: &str, raw_text: &str) -> NotifierResult<DraftPreview> {
        self.actor_handle.submit(title, raw_text).await
    }

    pub async fn request_refinement(&self) -> NotifierResult<()> {
        self.actor_handle.request_refinement().await
    }

    pub async fn cancel_refinement(&self) -> NotifierResult<()> {
        self.actor_handle.cancel_refinement().await
    }

    /// Regenerate with the feedback applied on top of earlier corrections
    pub async fn submit_feedback(&self, feedback: &str) -> NotifierResult<DraftPreview> {
        self.actor_handle.submit_feedback(feedback).await
    }

    pub async fn edit(&self, edit: DraftEdit) -> NotifierResult<bool> {
        self.actor_handle.edit(edit).await
    }

    /// Publish as the given actor, recorded as `published_by`
    pub async fn publish(&self, actor_id: &str) -> NotifierResult<PublishReceipt> {
        self.actor_handle.publish(actor_id).await
    }

    /// Publish as the session's actor. Authorization is the caller's concern.
    pub async fn publish_as(&self, session: &Session) -> NotifierResult<PublishReceipt> {
        self.publish(&session.actor_id).await
    }

    /// Drop the draft; a pending submit resolves with `DraftAbandoned`
    pub async fn abandon(&self) -> NotifierResult<bool> {
        self.actor_handle.abandon().await
    }

    pub async fn snapshot(&self) -> NotifierResult<DraftSnapshot> {
        self.actor_handle.snapshot().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> NotifierResult<()> {
        self.actor_handle.shutdown().await
    }
}

//! Draft pipeline: admin text in, publishable event out.

mod actor;
pub mod fallback;
#[cfg(feature = "gemini")]
mod gemini;
pub mod generator;
mod handle;
pub mod pipeline;
pub mod prompt;

pub use actor::{DraftActor, DraftActorHandle, DraftPreview};
pub use fallback::LocalDraftGenerator;
#[cfg(feature = "gemini")]
pub use gemini::GeminiDraftGenerator;
pub use generator::{generate_with_retry, DraftGenerator, GenerationError, GenerationRequest, RetryPolicy};
pub use handle::DraftHandle;
pub use pipeline::{
    Completion, DraftEdit, DraftPhase, DraftPipeline, DraftSnapshot, GenerationTicket,
    PipelineSettings, PublishReceipt,
};

use crate::config::Config;
use std::sync::Arc;
use tracing::info;

/// Pick the draft generator the configuration allows
pub fn build_generator(config: &Config) -> Arc<dyn DraftGenerator> {
    #[cfg(feature = "gemini")]
    if let Some(api_key) = &config.gemini_api_key {
        return Arc::new(GeminiDraftGenerator::new(
            api_key,
            &config.gemini_model,
            config.priorities.clone(),
        ));
    }

    info!("No generation service configured, drafts are built locally");
    Arc::new(LocalDraftGenerator::new(config.priorities.clone()))
}

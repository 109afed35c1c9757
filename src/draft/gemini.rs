use super::generator::{
    classify_provider_error, parse_draft_response, DraftGenerator, GenerationError, GenerationRequest,
};
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::events::{PriorityScale, RawRecord};
use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::providers::gemini::Client as GeminiClient;
use tracing::{debug, info};

/// Draft generator backed by Google Gemini through rig
pub struct GeminiDraftGenerator {
    client: GeminiClient,
    model: String,
    priorities: PriorityScale,
}

impl GeminiDraftGenerator {
    pub fn new(api_key: &str, model: &str, priorities: PriorityScale) -> Self {
        info!("Using Gemini model: {}", model);
        Self {
            client: GeminiClient::new(api_key),
            model: model.to_string(),
            priorities,
        }
    }
}

#[async_trait]
impl DraftGenerator for GeminiDraftGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawRecord, GenerationError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(SYSTEM_PROMPT)
            .temperature(0.2)
            .build();

        let response = agent
            .chat(build_prompt(request, &self.priorities), Vec::<Message>::new())
            .await
            .map_err(|e| classify_provider_error(&e.to_string()))?;

        debug!("Received {} bytes from Gemini", response.len());
        parse_draft_response(&response)
    }
}

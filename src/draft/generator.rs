use crate::events::RawRecord;
use async_trait::async_trait;
use serde_json::{from_str, Value};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the admin supplied for one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub title: String,
    pub raw_text: String,
    /// Corrections collected while refining; they override earlier output
    pub feedback: Option<String>,
}

/// Ways a draft generation can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The service is overloaded or briefly down; worth retrying
    #[error("service temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("generation rejected: {0}")]
    Permanent(String),
    /// The reply could not be read as a draft object
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Unavailable(_))
    }
}

/// External service turning admin text into structured draft fields.
///
/// Implementations return the reply as a raw record; type coercion happens
/// on receipt through the normalizer.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<RawRecord, GenerationError>;
}

/// Bounded retry with a growing delay, for transient failures only
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every retry
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1200),
            backoff_factor: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_factor.max(1.0).powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }
}

/// Run the generator, retrying transient failures.
///
/// The token is checked before every attempt and while waiting between
/// attempts; a cancelled token ends the loop with [`GenerationError::Cancelled`].
pub async fn generate_with_retry(
    generator: &dyn DraftGenerator,
    request: &GenerationRequest,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<RawRecord, GenerationError> {
    let mut retry = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        debug!("Requesting draft from {} (retry {})", generator.name(), retry);
        match generator.generate(request).await {
            Ok(draft) => {
                info!("Received draft from {}", generator.name());
                return Ok(draft);
            }
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                warn!(
                    "{} unavailable ({}), retry {}/{} in {:?}",
                    generator.name(),
                    e,
                    retry,
                    policy.max_retries,
                    delay
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => {
                warn!("Draft generation with {} failed: {}", generator.name(), e);
                return Err(e);
            }
        }
    }
}

/// Sort a provider error message into transient or permanent
pub fn classify_provider_error(message: &str) -> GenerationError {
    let lower = message.to_ascii_lowercase();
    let transient = ["503", "429", "overloaded", "unavailable", "resource_exhausted", "rate limit"]
        .iter()
        .any(|marker| lower.contains(marker));

    if transient {
        GenerationError::Unavailable(message.to_string())
    } else {
        GenerationError::Permanent(message.to_string())
    }
}

/// Extract the draft object from a model reply.
///
/// Accepts clean JSON, JSON wrapped in markdown code fences, or JSON with
/// stray text around it.
pub fn parse_draft_response(response: &str) -> Result<RawRecord, GenerationError> {
    let clean = strip_code_fence(response.trim());

    if let Ok(Value::Object(map)) = from_str::<Value>(clean) {
        return Ok(map);
    }

    // Try the outermost braces in case the model added commentary
    if let (Some(start), Some(end)) = (clean.find('{'), clean.rfind('}')) {
        if start < end {
            match from_str::<Value>(&clean[start..=end]) {
                Ok(Value::Object(map)) => return Ok(map),
                Ok(_) => {}
                Err(e) => debug!("Failed to parse extracted JSON object: {}", e),
            }
        }
    }

    Err(GenerationError::Malformed(format!(
        "no JSON object in response: {:.80}",
        response
    )))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

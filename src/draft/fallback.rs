use super::generator::{DraftGenerator, GenerationError, GenerationRequest};
use crate::events::models::{DEFAULT_EVENT_TYPE, GENERAL_TAG, UNKNOWN_VENUE};
use crate::events::time::UNKNOWN_TIME;
use crate::events::{PriorityScale, RawRecord};
use async_trait::async_trait;
use serde_json::{json, Value};

const SUMMARY_LIMIT: usize = 280;

/// Minimal draft built from the admin's own text, used when no generation
/// service is configured or the configured one failed.
pub fn fallback_draft(request: &GenerationRequest, priorities: &PriorityScale) -> RawRecord {
    let record = json!({
        "title_ai": request.title.trim(),
        "summary_ai": leading_sentences(&request.raw_text),
        "description_ai": request.raw_text.trim(),
        "department_tags": [GENERAL_TAG],
        "event_type": DEFAULT_EVENT_TYPE,
        "priority": priorities.lowest(),
        "venue": UNKNOWN_VENUE,
        "start_time": UNKNOWN_TIME,
        "end_time": UNKNOWN_TIME,
    });

    match record {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

/// First two sentences of `text`, capped in length
fn leading_sentences(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }

    let summary = format!("{}.", sentences.join(". "));
    if summary.chars().count() <= SUMMARY_LIMIT {
        return summary;
    }

    let mut cut: String = summary.chars().take(SUMMARY_LIMIT - 1).collect();
    cut.push('…');
    cut
}

/// Generator that never calls out; always answers with [`fallback_draft`]
#[derive(Debug, Clone, Default)]
pub struct LocalDraftGenerator {
    priorities: PriorityScale,
}

impl LocalDraftGenerator {
    pub fn new(priorities: PriorityScale) -> Self {
        Self { priorities }
    }
}

#[async_trait]
impl DraftGenerator for LocalDraftGenerator {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<RawRecord, GenerationError> {
        Ok(fallback_draft(request, &self.priorities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw_text: &str) -> GenerationRequest {
        GenerationRequest {
            title: " Library Hours ".into(),
            raw_text: raw_text.into(),
            feedback: None,
        }
    }

    #[test]
    fn test_leading_sentences() {
        assert_eq!(
            leading_sentences("Library closes early. Bring your cards. Exams next week."),
            "Library closes early. Bring your cards."
        );
        assert_eq!(leading_sentences("No full stop"), "No full stop.");
        assert_eq!(leading_sentences("  "), "");

        let long = "x".repeat(400);
        let summary = leading_sentences(&long);
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_fallback_draft_fields() {
        let draft = fallback_draft(&request("Open till 8. Closed Sunday."), &PriorityScale::default());

        assert_eq!(draft["title_ai"], "Library Hours");
        assert_eq!(draft["summary_ai"], "Open till 8. Closed Sunday.");
        assert_eq!(draft["description_ai"], "Open till 8. Closed Sunday.");
        assert_eq!(draft["department_tags"], json!(["General"]));
        assert_eq!(draft["event_type"], "general");
        assert_eq!(draft["priority"], "normal");
        assert_eq!(draft["venue"], "TBD");
        assert_eq!(draft["start_time"], "TBD");
    }

    #[tokio::test]
    async fn test_local_generator_never_fails() {
        let generator = LocalDraftGenerator::new(PriorityScale::parse("low,high"));
        let draft = generator.generate(&request("Text.")).await.unwrap();
        assert_eq!(draft["priority"], "low");
    }
}

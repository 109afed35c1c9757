use super::generator::GenerationRequest;
use crate::events::PriorityScale;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Event types the model is asked to choose from. Stored events may use others.
pub const EVENT_TYPES: [&str; 7] = [
    "workshop",
    "seminar",
    "hackathon",
    "cultural",
    "sports",
    "academic",
    "general",
];

pub const SYSTEM_PROMPT: &str = "You are an assistant for a college event notification system. You convert raw event text into a structured event object that is rendered directly in a production UI. Output valid JSON only.";

/// Shape the model is asked to produce
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedDraft {
    /// Clear event title
    pub title_ai: String,
    /// High-level overview without venue or dates
    pub summary_ai: String,
    /// Full description, faithful to the source text
    pub description_ai: String,
    /// Departments the event concerns
    pub department_tags: Vec<String>,
    pub event_type: String,
    pub priority: String,
    /// Venue, or "TBD"
    pub venue: String,
    /// ISO 8601 start, or "TBD"
    pub start_time: String,
    /// ISO 8601 end, or "TBD"
    pub end_time: String,
}

/// Build the user prompt for one generation
pub fn build_prompt(request: &GenerationRequest, priorities: &PriorityScale) -> String {
    let correction = match request.feedback.as_deref().map(str::trim) {
        Some(feedback) if !feedback.is_empty() => format!(
            "IMPORTANT:\nThe user has corrected your previous output.\n\
             Apply these instructions EXACTLY. If anything conflicts, the correction overrides everything else.\n\n\
             User correction:\n{feedback}"
        ),
        _ => "No corrections provided.".to_string(),
    };

    let schema = serde_json::to_string_pretty(&schemars::schema_for!(GeneratedDraft))
        .unwrap_or_default();

    format!(
        "==== PRIMARY INPUT ====\n\n\
         Event title:\n{title}\n\n\
         Raw event description:\n{raw_text}\n\n\
         ==== CORRECTION OVERRIDE ====\n\n\
         {correction}\n\n\
         ==== STRICT RULES ====\n\n\
         - Be factual and conservative; do not invent information\n\
         - Extract dates and venue; if a field is missing or unclear use \"TBD\"\n\
         - summary_ai is a high-level overview and must not repeat venue or dates\n\
         - If bullet points are requested use \"•\" with 3-5 bullets at most\n\
         - Convert dates to ISO 8601 when present\n\
         - event_type is one of: {event_types}\n\
         - priority is one of: {priorities}\n\
         - Output MUST be a single JSON object: no markdown, no headings, no commentary\n\n\
         ==== OUTPUT SCHEMA ====\n\n\
         {schema}",
        title = request.title,
        raw_text = request.raw_text,
        event_types = EVENT_TYPES.join(", "),
        priorities = priorities.levels().join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(feedback: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            title: "Robotics Expo".into(),
            raw_text: "Robots on display in the main hall.".into(),
            feedback: feedback.map(str::to_string),
        }
    }

    #[test]
    fn test_prompt_carries_inputs_and_vocabulary() {
        let prompt = build_prompt(&request(None), &PriorityScale::parse("low,normal,high"));

        assert!(prompt.contains("Robotics Expo"));
        assert!(prompt.contains("Robots on display in the main hall."));
        assert!(prompt.contains("No corrections provided."));
        assert!(prompt.contains("priority is one of: low, normal, high"));
        assert!(prompt.contains("hackathon"));
        assert!(prompt.contains("department_tags"));
    }

    #[test]
    fn test_feedback_overrides() {
        let prompt = build_prompt(&request(Some("Venue is Hall C")), &PriorityScale::default());
        assert!(prompt.contains("User correction:\nVenue is Hall C"));
        assert!(prompt.contains("overrides everything else"));
        assert!(!prompt.contains("No corrections provided."));

        let blank = build_prompt(&request(Some("  ")), &PriorityScale::default());
        assert!(blank.contains("No corrections provided."));
    }
}

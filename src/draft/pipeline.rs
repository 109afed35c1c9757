//! State machine for one admin's in-progress event draft.
//!
//! ```text
//! Idle ──submit──▶ Processing ──ok──▶ Previewing ──publish──▶ (published)
//!  ▲                  │  ▲               │  ▲                     │
//!  └──── failure ─────┘  └── feedback ── Refining ◀──┘            │
//!  └──────────────────────── reset, receipt kept ◀────────────────┘
//! ```
//!
//! Publishing is the end of a draft: the receipt is recorded and the pipeline
//! is back in `Idle`, ready for the next one. `abandon` returns to `Idle` from
//! any phase.
//!
//! Entering `Processing` hands out a [`GenerationTicket`]. Its epoch must be
//! presented with the outcome; outcomes for any other epoch (a draft that was
//! abandoned meanwhile) are ignored.

use super::generator::{GenerationError, GenerationRequest, RetryPolicy};
use crate::config::Config;
use crate::error::{generation_error, validation_error, Error, NotifierResult};
use crate::events::models::GENERAL_TAG;
use crate::events::normalize::{
    resolve_tags, resolve_text, Normalizer, CREATED_AT_FIELDS, DESCRIPTION_FIELDS, TAG_FIELDS,
    TITLE_FIELDS, UPDATED_AT_FIELDS,
};
use crate::events::{CanonicalEvent, EventTime, PriorityScale, RawRecord};
use crate::store::to_stored_record;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Idle,
    Processing,
    Previewing,
    Refining,
}

impl fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftPhase::Idle => "idle",
            DraftPhase::Processing => "processing",
            DraftPhase::Previewing => "previewing",
            DraftPhase::Refining => "refining",
        };
        f.write_str(name)
    }
}

/// Permission to run one generation, stamped with the draft epoch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub epoch: u64,
    pub request: GenerationRequest,
}

/// How a generation outcome was absorbed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The generated draft is ready for preview
    Generated,
    /// Generation failed; a local draft is shown instead
    Fallback(String),
    /// The outcome belonged to an abandoned draft and was dropped
    Stale,
}

/// In-place edits allowed while previewing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Title(String),
    Description(String),
    Venue(String),
    StartTime(String),
    EndTime(String),
    AddTag(String),
    RemoveTag(String),
}

/// Proof of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub id: String,
    pub published_by: String,
    pub published_at: DateTime<Utc>,
}

/// Point-in-time copy of the pipeline for display
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
    pub phase: DraftPhase,
    pub draft: Option<CanonicalEvent>,
    pub feedback: Vec<String>,
    pub last_published: Option<PublishReceipt>,
}

/// Behaviour switches for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub priorities: PriorityScale,
    /// Show a local draft when the first generation fails
    pub local_fallback: bool,
    pub retry: RetryPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            priorities: config.priorities.clone(),
            local_fallback: config.local_fallback,
            retry: config.retry.clone(),
        }
    }
}

#[derive(Debug)]
pub struct DraftPipeline {
    settings: PipelineSettings,
    phase: DraftPhase,
    epoch: u64,
    draft_id: String,
    title: String,
    raw_text: String,
    feedback: Vec<String>,
    draft: Option<CanonicalEvent>,
    last_published: Option<PublishReceipt>,
}

impl DraftPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            phase: DraftPhase::Idle,
            epoch: 0,
            draft_id: String::new(),
            title: String::new(),
            raw_text: String::new(),
            feedback: Vec::new(),
            draft: None,
            last_published: None,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn draft(&self) -> Option<&CanonicalEvent> {
        self.draft.as_ref()
    }

    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    pub fn last_published(&self) -> Option<&PublishReceipt> {
        self.last_published.as_ref()
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            phase: self.phase,
            draft: self.draft.clone(),
            feedback: self.feedback.clone(),
            last_published: self.last_published.clone(),
        }
    }

    /// Start a new draft from the admin's title and text
    pub fn submit(&mut self, title: &str, raw_text: &str) -> NotifierResult<GenerationTicket> {
        match self.phase {
            DraftPhase::Idle => {}
            DraftPhase::Processing => return Err(Error::Busy),
            phase => return Err(invalid("start a new draft", phase)),
        }

        let (title, raw_text) = (title.trim(), raw_text.trim());
        if title.is_empty() || raw_text.is_empty() {
            return Err(validation_error("Please enter both event title and event details"));
        }

        self.title = title.to_string();
        self.raw_text = raw_text.to_string();
        self.feedback.clear();
        self.draft = None;
        self.draft_id = format!("evt_{}", uuid::Uuid::new_v4().simple());

        Ok(self.enter_processing())
    }

    pub fn request_refinement(&mut self) -> NotifierResult<()> {
        self.require_phase(DraftPhase::Previewing, "request refinement")?;
        self.phase = DraftPhase::Refining;
        Ok(())
    }

    /// Leave refinement without touching the draft
    pub fn cancel_refinement(&mut self) -> NotifierResult<()> {
        self.require_phase(DraftPhase::Refining, "cancel refinement")?;
        self.phase = DraftPhase::Previewing;
        Ok(())
    }

    /// Regenerate with the accumulated feedback
    pub fn submit_feedback(&mut self, feedback: &str) -> NotifierResult<GenerationTicket> {
        self.require_phase(DraftPhase::Refining, "submit feedback")?;

        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(validation_error("Feedback must not be empty"));
        }

        self.feedback.push(feedback.to_string());
        Ok(self.enter_processing())
    }

    /// Absorb the outcome of the generation started with `epoch`.
    ///
    /// Failures never lose work: a refinement failure keeps the previous
    /// draft in preview, a first failure falls back to a local draft when
    /// configured, and otherwise returns the pipeline to `Idle`.
    pub fn complete(
        &mut self,
        epoch: u64,
        outcome: Result<RawRecord, GenerationError>,
    ) -> NotifierResult<Completion> {
        if self.phase != DraftPhase::Processing || epoch != self.epoch {
            return Ok(Completion::Stale);
        }

        let failure = match outcome.map(|raw| self.draft_from_generated(raw)) {
            Ok(Ok(draft)) => {
                self.draft = Some(draft);
                self.phase = DraftPhase::Previewing;
                return Ok(Completion::Generated);
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };

        if self.draft.is_some() {
            // refinement failed: drop the feedback that did not apply
            self.feedback.pop();
            self.phase = DraftPhase::Previewing;
            return Err(generation_error(&failure));
        }

        if self.settings.local_fallback {
            let request = self.request();
            let raw = super::fallback::fallback_draft(&request, &self.settings.priorities);
            self.draft = Some(self.draft_from_generated(raw)?);
            self.phase = DraftPhase::Previewing;
            return Ok(Completion::Fallback(failure));
        }

        self.phase = DraftPhase::Idle;
        Err(generation_error(&failure))
    }

    /// Apply one edit to the previewed draft. Returns whether anything changed.
    pub fn edit(&mut self, edit: DraftEdit) -> NotifierResult<bool> {
        self.require_phase(DraftPhase::Previewing, "edit the draft")?;
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| invalid("edit the draft", DraftPhase::Previewing))?;

        let changed = match edit {
            DraftEdit::Title(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(validation_error("Title must not be empty"));
                }
                replace(&mut draft.title, title.to_string())
            }
            DraftEdit::Description(text) => replace(&mut draft.description, text),
            DraftEdit::Venue(venue) => replace(&mut draft.venue, venue),
            DraftEdit::StartTime(text) => replace(&mut draft.start_time, EventTime::parse(&text)),
            DraftEdit::EndTime(text) => replace(&mut draft.end_time, EventTime::parse(&text)),
            DraftEdit::AddTag(tag) => draft.add_tag(&tag),
            DraftEdit::RemoveTag(tag) => draft.remove_tag(&tag),
        };
        Ok(changed)
    }

    /// The identifier and stored document to write for the previewed draft
    pub fn publish_payload(&self, actor_id: &str, now: DateTime<Utc>) -> NotifierResult<(String, RawRecord)> {
        self.require_phase(DraftPhase::Previewing, "publish")?;
        if actor_id.trim().is_empty() {
            return Err(validation_error("Publishing requires an actor identifier"));
        }
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| invalid("publish", DraftPhase::Previewing))?;

        Ok((draft.id.clone(), to_stored_record(draft, actor_id.trim(), now)))
    }

    /// Record a successful write; the draft is released and the pipeline resets
    pub fn mark_published(&mut self, receipt: PublishReceipt) -> NotifierResult<()> {
        self.require_phase(DraftPhase::Previewing, "mark as published")?;
        self.draft = None;
        self.feedback.clear();
        self.last_published = Some(receipt);
        self.phase = DraftPhase::Idle;
        Ok(())
    }

    /// Discard the draft from any phase. A generation still in flight will
    /// have its outcome ignored.
    pub fn abandon(&mut self) -> bool {
        let had_work = self.phase != DraftPhase::Idle;
        self.epoch += 1;
        self.phase = DraftPhase::Idle;
        self.draft = None;
        self.feedback.clear();
        had_work
    }

    fn enter_processing(&mut self) -> GenerationTicket {
        self.epoch += 1;
        self.phase = DraftPhase::Processing;
        GenerationTicket {
            epoch: self.epoch,
            request: self.request(),
        }
    }

    fn request(&self) -> GenerationRequest {
        GenerationRequest {
            title: self.title.clone(),
            raw_text: self.raw_text.clone(),
            feedback: (!self.feedback.is_empty()).then(|| self.feedback.join("\n")),
        }
    }

    /// Fill what the generator left out, then normalize under the draft id.
    ///
    /// Blank generated text counts as left out. An explicit empty tag list is
    /// kept: it addresses every department.
    fn draft_from_generated(&self, mut raw: RawRecord) -> NotifierResult<CanonicalEvent> {
        for field in CREATED_AT_FIELDS.iter().chain(UPDATED_AT_FIELDS) {
            raw.remove(*field);
        }
        raw.retain(|_, value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        });
        if resolve_text(&raw, TITLE_FIELDS).is_none() {
            raw.insert("title".to_string(), Value::String(self.title.clone()));
        }
        if resolve_text(&raw, DESCRIPTION_FIELDS).is_none() {
            raw.insert("description".to_string(), Value::String(self.raw_text.clone()));
        }
        if resolve_tags(&raw, TAG_FIELDS).is_none() {
            raw.insert("tags".to_string(), json!([GENERAL_TAG]));
        }

        Normalizer::new(self.settings.priorities.clone()).normalize(&raw, Some(&self.draft_id))
    }

    fn require_phase(&self, phase: DraftPhase, action: &'static str) -> NotifierResult<()> {
        if self.phase == phase {
            Ok(())
        } else if self.phase == DraftPhase::Processing {
            Err(Error::Busy)
        } else {
            Err(invalid(action, self.phase))
        }
    }
}

fn invalid(action: &'static str, phase: DraftPhase) -> Error {
    Error::InvalidTransition {
        action,
        state: phase.to_string(),
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

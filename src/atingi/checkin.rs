//! Check-in form state.
//!
//! A check-in captures per-key-result confidence updates against a single
//! objective. The form is a plain struct with pure update functions so the
//! merge and fallback rules can be unit tested without any HTTP wiring; the
//! handlers own locking and session lifetime.

use crate::atingi::model::{Confidence, Initiative, KeyResult, Objective};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored when the suggestion service answers with an empty list.
pub const NO_SUGGESTIONS: &str = "No suggestions available for this objective yet.";

/// Stored when the suggestion service call fails.
pub const SUGGESTIONS_UNAVAILABLE: &str = "Could not fetch suggestions, try again later.";

/// One editable row of the form, seeded from a key result.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormEntry {
    pub key_result_id: Uuid,
    pub confidence: Confidence,
}

/// Event emitted by the form for the hosting layer to surface; the form
/// itself never talks to any notification mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInEvent {
    SuggestionsFailed { objective_id: Uuid, reason: String },
}

#[derive(Debug, Clone)]
pub struct CheckInForm {
    entries: Vec<FormEntry>,
    suggestions: Vec<String>,
}

impl CheckInForm {
    /// Seed one entry per key result, copying its current confidence.
    /// A fresh form starts with no suggestions.
    #[must_use]
    pub fn open(objective: &Objective) -> Self {
        let entries = objective
            .key_results
            .iter()
            .map(|key_result| FormEntry {
                key_result_id: key_result.id,
                confidence: key_result.confidence,
            })
            .collect();

        Self {
            entries,
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Update the entry for `key_result_id`, returning false when no entry
    /// with that id exists.
    pub fn set_confidence(&mut self, key_result_id: Uuid, confidence: Confidence) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.key_result_id == key_result_id)
        {
            Some(entry) => {
                entry.confidence = confidence;
                true
            }
            None => false,
        }
    }

    /// Produce the fully updated objective for submission.
    ///
    /// Per key result: confidence comes from the matching form entry, or is
    /// retained unchanged when no entry matches (stray entry ids are silently
    /// skipped). Progress is never touched. Optional collections are
    /// normalized to empty so the output always has a complete shape.
    #[must_use]
    pub fn merged(&self, objective: &Objective) -> Objective {
        Objective {
            id: objective.id,
            description: objective.description.clone(),
            key_results: objective
                .key_results
                .iter()
                .map(|key_result| KeyResult {
                    id: key_result.id,
                    description: key_result.description.clone(),
                    progress: key_result.progress,
                    confidence: self.confidence_for(key_result),
                    initiatives: Some(
                        key_result
                            .initiatives
                            .clone()
                            .unwrap_or_default()
                            .into_iter()
                            .map(|initiative| Initiative {
                                tasks: Some(initiative.tasks.unwrap_or_default()),
                                ..initiative
                            })
                            .collect(),
                    ),
                    risks: Some(key_result.risks.clone().unwrap_or_default()),
                    assignees: Some(key_result.assignees.clone().unwrap_or_default()),
                })
                .collect(),
        }
    }

    /// Objective snapshot for the suggestion service: the original record
    /// with the current, possibly unsaved, confidences overlaid.
    #[must_use]
    pub fn snapshot(&self, objective: &Objective) -> Objective {
        Objective {
            id: objective.id,
            description: objective.description.clone(),
            key_results: objective
                .key_results
                .iter()
                .map(|key_result| KeyResult {
                    confidence: self.confidence_for(key_result),
                    ..key_result.clone()
                })
                .collect(),
        }
    }

    /// Store the outcome of a suggestion request.
    ///
    /// A non-empty result replaces the stored suggestions verbatim; an empty
    /// result stores a single fallback string. A failure stores a single
    /// fallback error string and returns an event for the hosting layer; the
    /// error never propagates further.
    pub fn apply_suggestions(
        &mut self,
        objective_id: Uuid,
        outcome: anyhow::Result<Vec<String>>,
    ) -> Option<CheckInEvent> {
        match outcome {
            Ok(suggestions) if suggestions.is_empty() => {
                self.suggestions = vec![NO_SUGGESTIONS.to_string()];
                None
            }
            Ok(suggestions) => {
                self.suggestions = suggestions;
                None
            }
            Err(err) => {
                self.suggestions = vec![SUGGESTIONS_UNAVAILABLE.to_string()];
                Some(CheckInEvent::SuggestionsFailed {
                    objective_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn confidence_for(&self, key_result: &KeyResult) -> Confidence {
        self.entries
            .iter()
            .find(|entry| entry.key_result_id == key_result.id)
            .map_or(key_result.confidence, |entry| entry.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atingi::model::{Assignee, Risk, Task};
    use anyhow::anyhow;

    fn objective() -> Objective {
        Objective {
            id: Uuid::new_v4(),
            description: "Launch in two new markets".to_string(),
            key_results: vec![
                KeyResult {
                    id: Uuid::new_v4(),
                    description: "Localize onboarding".to_string(),
                    progress: 60.0,
                    confidence: Confidence::OnTrack,
                    initiatives: Some(vec![Initiative {
                        id: Uuid::new_v4(),
                        description: "Translate copy".to_string(),
                        tasks: None,
                    }]),
                    risks: None,
                    assignees: Some(vec![Assignee {
                        id: Uuid::new_v4(),
                        name: "Dana".to_string(),
                    }]),
                },
                KeyResult {
                    id: Uuid::new_v4(),
                    description: "Sign two local partners".to_string(),
                    progress: 10.0,
                    confidence: Confidence::AtRisk,
                    initiatives: None,
                    risks: Some(vec![Risk {
                        id: Uuid::new_v4(),
                        description: "Regulatory review pending".to_string(),
                    }]),
                    assignees: None,
                },
            ],
        }
    }

    #[test]
    fn open_seeds_one_entry_per_key_result() {
        let objective = objective();
        let form = CheckInForm::open(&objective);

        assert_eq!(form.entries().len(), objective.key_results.len());
        for (entry, key_result) in form.entries().iter().zip(&objective.key_results) {
            assert_eq!(entry.key_result_id, key_result.id);
            assert_eq!(entry.confidence, key_result.confidence);
        }
        assert!(form.suggestions().is_empty());
    }

    #[test]
    fn merged_without_edits_only_normalizes_optional_collections() {
        let objective = objective();
        let merged = CheckInForm::open(&objective).merged(&objective);

        assert_eq!(merged.id, objective.id);
        assert_eq!(merged.description, objective.description);
        for (out, original) in merged.key_results.iter().zip(&objective.key_results) {
            assert_eq!(out.id, original.id);
            assert_eq!(out.confidence, original.confidence);
            assert!((out.progress - original.progress).abs() < f64::EPSILON);
            assert!(out.initiatives.is_some());
            assert!(out.risks.is_some());
            assert!(out.assignees.is_some());
        }
        // Absent task lists inside initiatives come back empty, not None.
        let tasks = merged.key_results[0].initiatives.as_ref().unwrap()[0]
            .tasks
            .as_ref()
            .unwrap();
        assert!(tasks.is_empty());
        assert_eq!(merged.key_results[1].initiatives, Some(Vec::new()));
    }

    #[test]
    fn merged_preserves_existing_tasks() {
        let mut objective = objective();
        let task = Task {
            id: Uuid::new_v4(),
            description: "Review translations".to_string(),
            done: true,
        };
        objective.key_results[0].initiatives.as_mut().unwrap()[0].tasks =
            Some(vec![task.clone()]);

        let merged = CheckInForm::open(&objective).merged(&objective);
        let tasks = merged.key_results[0].initiatives.as_ref().unwrap()[0]
            .tasks
            .as_ref()
            .unwrap();
        assert_eq!(tasks, &vec![task]);
    }

    #[test]
    fn merged_applies_edited_confidence_to_that_key_result_only() {
        let objective = objective();
        let edited = objective.key_results[1].id;
        let mut form = CheckInForm::open(&objective);
        assert!(form.set_confidence(edited, Confidence::OffTrack));

        let merged = form.merged(&objective);
        assert_eq!(merged.key_results[1].confidence, Confidence::OffTrack);
        assert_eq!(
            merged.key_results[0].confidence,
            objective.key_results[0].confidence
        );
    }

    #[test]
    fn set_confidence_for_unknown_key_result_is_rejected() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        assert!(!form.set_confidence(Uuid::new_v4(), Confidence::OffTrack));
        // Nothing changed.
        let merged = form.merged(&objective);
        for (out, original) in merged.key_results.iter().zip(&objective.key_results) {
            assert_eq!(out.confidence, original.confidence);
        }
    }

    #[test]
    fn snapshot_overlays_unsaved_confidences() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        form.set_confidence(objective.key_results[0].id, Confidence::OffTrack);

        let snapshot = form.snapshot(&objective);
        assert_eq!(snapshot.key_results[0].confidence, Confidence::OffTrack);
        // Snapshot leaves the optional collections as they were.
        assert!(snapshot.key_results[1].initiatives.is_none());
    }

    #[test]
    fn suggestions_stored_verbatim_in_order() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        let event = form.apply_suggestions(
            objective.id,
            Ok(vec!["Split KR2".to_string(), "Add an owner".to_string()]),
        );
        assert!(event.is_none());
        assert_eq!(form.suggestions(), ["Split KR2", "Add an owner"]);
    }

    #[test]
    fn empty_suggestion_response_stores_single_fallback() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        let event = form.apply_suggestions(objective.id, Ok(Vec::new()));
        assert!(event.is_none());
        assert_eq!(form.suggestions(), [NO_SUGGESTIONS]);
    }

    #[test]
    fn failed_suggestion_call_stores_fallback_and_emits_event() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        let event = form.apply_suggestions(objective.id, Err(anyhow!("connection refused")));
        assert_eq!(form.suggestions(), [SUGGESTIONS_UNAVAILABLE]);
        assert_eq!(
            event,
            Some(CheckInEvent::SuggestionsFailed {
                objective_id: objective.id,
                reason: "connection refused".to_string(),
            })
        );
    }

    #[test]
    fn reopening_clears_previous_suggestions() {
        let objective = objective();
        let mut form = CheckInForm::open(&objective);
        form.apply_suggestions(objective.id, Ok(vec!["Old advice".to_string()]));
        assert!(!form.suggestions().is_empty());

        let reopened = CheckInForm::open(&objective);
        assert!(reopened.suggestions().is_empty());
    }
}

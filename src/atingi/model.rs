//! Domain model for objectives and their key results.
//!
//! Optional collections are kept as `Option<Vec<_>>` on purpose: objectives
//! arrive from upstream with those fields possibly absent, and a submitted
//! check-in must normalize them to empty collections. Keeping the `Option`
//! makes that normalization observable instead of hidden by serde defaults.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Qualitative self-assessment of how likely a key result is to be achieved.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    OnTrack,
    AtRisk,
    OffTrack,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Objective {
    pub id: Uuid,
    pub description: String,
    pub key_results: Vec<KeyResult>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyResult {
    pub id: Uuid,
    pub description: String,
    /// Percent complete, 0-100. Computed upstream from task completion;
    /// read-only in this service.
    pub progress: f64,
    pub confidence: Confidence,
    #[serde(default)]
    pub initiatives: Option<Vec<Initiative>>,
    #[serde(default)]
    pub risks: Option<Vec<Risk>>,
    #[serde(default)]
    pub assignees: Option<Vec<Assignee>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Initiative {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub description: String,
    pub done: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Risk {
    pub id: Uuid,
    pub description: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Assignee {
    pub id: Uuid,
    pub name: String,
}

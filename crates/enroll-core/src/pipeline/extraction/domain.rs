use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::profile::ProfileId;

/// Identifier wrapper for extraction jobs. Doubles as the logical
/// generation counter on the owning profile: the profile's
/// `current_job_id` names the one job allowed to commit its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Storage locator for an uploaded document blob. Documents are
/// write-once; a re-upload creates a new key, never mutates the old.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey(pub String);

/// Lifecycle of a job. Transitions queued → running → terminal exactly
/// once; there is no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub const fn label(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// One asynchronous extraction of a grade average from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub id: JobId,
    pub profile_id: ProfileId,
    pub document: DocumentKey,
    pub state: JobState,
    /// Rounded average on success; `None` both while pending and for a
    /// successful run that extracted nothing.
    pub result: Option<f64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExtractionJob {
    pub fn queued(id: JobId, profile_id: ProfileId, document: DocumentKey) -> Self {
        Self {
            id,
            profile_id,
            document,
            state: JobState::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Poll-facing view: queued and running jobs both read as pending.
    pub fn status_view(&self) -> JobStatusView {
        match self.state {
            JobState::Queued | JobState::Running => JobStatusView::Pending,
            JobState::Succeeded => JobStatusView::Succeeded {
                result: self.result,
            },
            JobState::Failed => JobStatusView::Failed {
                error: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "extraction failed".to_string()),
            },
        }
    }
}

/// Serialized status surface for the polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatusView {
    Pending,
    Succeeded { result: Option<f64> },
    Failed { error: String },
}

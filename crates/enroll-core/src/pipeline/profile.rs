use serde::{Deserialize, Serialize};

use super::extraction::domain::JobId;

/// Identifier wrapper for applicant profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// The slice of an applicant profile this pipeline reads and writes.
///
/// `current_job_id` is the generation pointer for extraction results: a
/// completed job may write `calculated_average_grade` only while it is
/// still the job the pointer names. The rest of the profile lives with
/// the out-of-scope identity system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub id: ProfileId,
    pub calculated_average_grade: Option<f64>,
    pub current_job_id: Option<JobId>,
}

impl ApplicantProfile {
    pub fn new(id: ProfileId) -> Self {
        Self {
            id,
            calculated_average_grade: None,
            current_job_id: None,
        }
    }
}

/// Storage abstraction over applicant profiles so the pipeline can be
/// exercised in isolation from the real profile store.
pub trait ProfileStore: Send + Sync {
    fn fetch(&self, id: &ProfileId) -> Result<Option<ApplicantProfile>, ProfileStoreError>;

    /// Point the profile at a newly submitted extraction job, making it
    /// the authoritative one for that profile.
    fn set_current_job(&self, id: &ProfileId, job: &JobId) -> Result<(), ProfileStoreError>;

    /// Compare-and-set application of a finished job's result: writes the
    /// score only if `job` still equals the profile's current job id.
    /// Returns whether the write was applied.
    fn apply_score(
        &self,
        id: &ProfileId,
        job: &JobId,
        score: Option<f64>,
    ) -> Result<bool, ProfileStoreError>;
}

/// Error enumeration for profile store failures.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile not found")]
    NotFound,
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

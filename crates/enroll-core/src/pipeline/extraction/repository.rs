use super::domain::{DocumentKey, ExtractionJob, JobId};
use crate::pipeline::profile::ProfileId;

/// Storage abstraction for extraction jobs so the manager can be
/// exercised against in-memory fakes.
pub trait JobStore: Send + Sync {
    fn insert(&self, job: ExtractionJob) -> Result<(), JobStoreError>;
    fn update(&self, job: ExtractionJob) -> Result<(), JobStoreError>;
    fn fetch(&self, id: &JobId) -> Result<Option<ExtractionJob>, JobStoreError>;
}

/// Error enumeration for job store failures.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job already exists")]
    Conflict,
    #[error("job not found")]
    NotFound,
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// Write-once blob store for uploaded documents.
pub trait DocumentStore: Send + Sync {
    fn put(&self, owner: &ProfileId, bytes: Vec<u8>) -> Result<DocumentKey, DocumentStoreError>;
    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, DocumentStoreError>;
}

/// Error enumeration for document store failures.
#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document not found")]
    NotFound,
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

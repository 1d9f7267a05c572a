use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::domain::{ExtractionJob, JobId, JobState, JobStatusView};
use super::ocr::{self, TextRecognizer};
use super::repository::{DocumentStore, DocumentStoreError, JobStore, JobStoreError};
use crate::pipeline::profile::{ProfileId, ProfileStore, ProfileStoreError};

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Composes the OCR pipeline into an asynchronous, pollable unit of
/// work. `submit` enqueues and returns immediately; a worker task runs
/// the pipeline and commits the result to the profile under the
/// compare-and-set rule on the profile's current job id.
pub struct ExtractionJobManager<J, P, D, R> {
    jobs: Arc<J>,
    profiles: Arc<P>,
    documents: Arc<D>,
    recognizer: Arc<R>,
    ocr_timeout: Duration,
}

// Manual impl: the derived one would demand Clone on the generics.
impl<J, P, D, R> Clone for ExtractionJobManager<J, P, D, R> {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            profiles: self.profiles.clone(),
            documents: self.documents.clone(),
            recognizer: self.recognizer.clone(),
            ocr_timeout: self.ocr_timeout,
        }
    }
}

impl<J, P, D, R> ExtractionJobManager<J, P, D, R>
where
    J: JobStore + 'static,
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
    R: TextRecognizer + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        profiles: Arc<P>,
        documents: Arc<D>,
        recognizer: Arc<R>,
        ocr_timeout: Duration,
    ) -> Self {
        Self {
            jobs,
            profiles,
            documents,
            recognizer,
            ocr_timeout,
        }
    }

    /// Create a queued job for the document, make it the profile's
    /// authoritative job, and schedule execution. Only fast checks run
    /// here: the profile must exist and the blob must look like an
    /// image format we can decode. Deep decode failures surface later
    /// through the job's failed status.
    pub fn submit(&self, profile_id: ProfileId, blob: Vec<u8>) -> Result<JobId, SubmitError> {
        if self.profiles.fetch(&profile_id)?.is_none() {
            return Err(SubmitError::UnknownProfile);
        }
        image::guess_format(&blob).map_err(|_| SubmitError::UnreadableDocument)?;

        let document = self.documents.put(&profile_id, blob)?;
        let job = ExtractionJob::queued(next_job_id(), profile_id, document);
        self.jobs.insert(job.clone())?;
        self.profiles.set_current_job(&job.profile_id, &job.id)?;

        debug!(job = %job.id.0, profile = %job.profile_id.0, "extraction job queued");

        let manager = self.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            manager.run(job).await;
        });

        Ok(job_id)
    }

    /// Non-blocking read of a job's state.
    pub fn status(&self, id: &JobId) -> Result<Option<JobStatusView>, JobStoreError> {
        Ok(self.jobs.fetch(id)?.map(|job| job.status_view()))
    }

    async fn run(self, mut job: ExtractionJob) {
        job.state = JobState::Running;
        if let Err(err) = self.jobs.update(job.clone()) {
            error!(job = %job.id.0, %err, "failed to mark job running");
            return;
        }

        let blob = match self.documents.get(&job.document) {
            Ok(blob) => blob,
            Err(err) => {
                self.finish_failed(job, format!("document unavailable: {err}"))
                    .await;
                return;
            }
        };

        let recognizer = self.recognizer.clone();
        let work =
            tokio::task::spawn_blocking(move || ocr::extract_average(&blob, recognizer.as_ref()));

        match tokio::time::timeout(self.ocr_timeout, work).await {
            Err(_) => {
                self.finish_failed(
                    job,
                    format!("recognition timed out after {:?}", self.ocr_timeout),
                )
                .await;
            }
            Ok(Err(join_err)) => {
                self.finish_failed(job, format!("extraction task aborted: {join_err}"))
                    .await;
            }
            Ok(Ok(Err(err))) => {
                warn!(retryable = err.retryable(), %err, "extraction pipeline failed");
                self.finish_failed(job, err.to_string()).await;
            }
            Ok(Ok(Ok(outcome))) => {
                self.finish_succeeded(job, outcome.average).await;
            }
        }
    }

    async fn finish_succeeded(&self, mut job: ExtractionJob, result: Option<f64>) {
        job.state = JobState::Succeeded;
        job.result = result;
        job.completed_at = Some(chrono::Utc::now());
        if let Err(err) = self.jobs.update(job.clone()) {
            error!(job = %job.id.0, %err, "failed to record job success");
            return;
        }

        // Compare-and-set: only the job still named by the profile's
        // current pointer may write. A superseded job's result is
        // discarded silently; that is expected steady-state behavior,
        // not an error.
        match self
            .profiles
            .apply_score(&job.profile_id, &job.id, result)
        {
            Ok(true) => {
                debug!(job = %job.id.0, profile = %job.profile_id.0, result = ?result, "score applied");
            }
            Ok(false) => {
                debug!(job = %job.id.0, profile = %job.profile_id.0, "stale result discarded");
            }
            Err(err) => {
                error!(job = %job.id.0, %err, "failed to apply score to profile");
            }
        }
    }

    async fn finish_failed(&self, mut job: ExtractionJob, description: String) {
        job.state = JobState::Failed;
        job.error = Some(description);
        job.completed_at = Some(chrono::Utc::now());
        if let Err(err) = self.jobs.update(job.clone()) {
            error!(job = %job.id.0, %err, "failed to record job failure");
        }
    }
}

/// Error raised synchronously at submit time.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("profile not found")]
    UnknownProfile,
    #[error("document is not a readable image")]
    UnreadableDocument,
    #[error(transparent)]
    Profiles(#[from] ProfileStoreError),
    #[error(transparent)]
    Jobs(#[from] JobStoreError),
    #[error(transparent)]
    Documents(#[from] DocumentStoreError),
}

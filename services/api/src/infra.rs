use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;

use enroll_core::pipeline::extraction::{
    DocumentKey, DocumentStore, DocumentStoreError, ExtractionJob, JobId, JobStore, JobStoreError,
};
use enroll_core::pipeline::profile::{
    ApplicantProfile, ProfileId, ProfileStore, ProfileStoreError,
};
use enroll_core::pipeline::ranking::{
    Application, ApplicationDirectory, DirectoryError, FundingBasis, SlotId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Profile storage for deployments without the external identity
/// system. Profiles are created through the registration stub and live
/// for the lifetime of the process.
#[derive(Default)]
pub(crate) struct InMemoryProfileStore {
    profiles: Mutex<HashMap<ProfileId, ApplicantProfile>>,
    sequence: AtomicU64,
}

impl InMemoryProfileStore {
    /// Create a profile, generating an identifier unless one is given.
    /// Returns `None` when the requested identifier is already taken.
    pub(crate) fn create(&self, requested: Option<String>) -> Option<ProfileId> {
        let id = ProfileId(requested.unwrap_or_else(|| {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            format!("applicant-{id:06}")
        }));

        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        if guard.contains_key(&id) {
            return None;
        }
        guard.insert(id.clone(), ApplicantProfile::new(id.clone()));
        Some(id)
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn fetch(&self, id: &ProfileId) -> Result<Option<ApplicantProfile>, ProfileStoreError> {
        Ok(self
            .profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(id)
            .cloned())
    }

    fn set_current_job(&self, id: &ProfileId, job: &JobId) -> Result<(), ProfileStoreError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.get_mut(id).ok_or(ProfileStoreError::NotFound)?;
        profile.current_job_id = Some(job.clone());
        Ok(())
    }

    fn apply_score(
        &self,
        id: &ProfileId,
        job: &JobId,
        score: Option<f64>,
    ) -> Result<bool, ProfileStoreError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.get_mut(id).ok_or(ProfileStoreError::NotFound)?;
        if profile.current_job_id.as_ref() != Some(job) {
            return Ok(false);
        }
        profile.calculated_average_grade = score;
        Ok(true)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, ExtractionJob>>,
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: ExtractionJob) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(JobStoreError::Conflict);
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }

    fn update(&self, job: ExtractionJob) -> Result<(), JobStoreError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if !guard.contains_key(&job.id) {
            return Err(JobStoreError::NotFound);
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }

    fn fetch(&self, id: &JobId) -> Result<Option<ExtractionJob>, JobStoreError> {
        Ok(self
            .jobs
            .lock()
            .expect("job mutex poisoned")
            .get(id)
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    blobs: Mutex<HashMap<DocumentKey, Vec<u8>>>,
    sequence: AtomicU64,
}

impl DocumentStore for InMemoryDocumentStore {
    fn put(&self, _owner: &ProfileId, bytes: Vec<u8>) -> Result<DocumentKey, DocumentStoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let key = DocumentKey(format!("doc-{id:06}"));
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .insert(key.clone(), bytes);
        Ok(key)
    }

    fn get(&self, key: &DocumentKey) -> Result<Vec<u8>, DocumentStoreError> {
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .get(key)
            .cloned()
            .ok_or(DocumentStoreError::NotFound)
    }
}

/// Read-only view over applications for the ranking side. The rows are
/// owned by the out-of-scope application intake; here they are seeded
/// by the demo command or future wiring.
#[derive(Default)]
pub(crate) struct InMemoryApplicationDirectory {
    applications: Mutex<Vec<Application>>,
}

impl InMemoryApplicationDirectory {
    pub(crate) fn push(&self, application: Application) {
        self.applications
            .lock()
            .expect("directory mutex poisoned")
            .push(application);
    }
}

impl ApplicationDirectory for InMemoryApplicationDirectory {
    fn for_slot(
        &self,
        slot: &SlotId,
        basis: FundingBasis,
    ) -> Result<Vec<Application>, DirectoryError> {
        Ok(self
            .applications
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .filter(|application| &application.slot == slot && application.funding_basis == basis)
            .cloned()
            .collect())
    }

    fn attempts(
        &self,
        applicant: &ProfileId,
        slot: &SlotId,
    ) -> Result<Vec<Application>, DirectoryError> {
        Ok(self
            .applications
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .filter(|application| &application.applicant == applicant && &application.slot == slot)
            .cloned()
            .collect())
    }
}

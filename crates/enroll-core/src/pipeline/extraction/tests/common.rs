use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::GrayImage;

use crate::pipeline::extraction::domain::{DocumentKey, ExtractionJob, JobId, JobStatusView};
use crate::pipeline::extraction::ocr::{RecognizeError, TextRecognizer};
use crate::pipeline::extraction::repository::{
    DocumentStore, DocumentStoreError, JobStore, JobStoreError,
};
use crate::pipeline::extraction::service::ExtractionJobManager;
use crate::pipeline::profile::{ApplicantProfile, ProfileId, ProfileStore, ProfileStoreError};

#[derive(Default)]
pub(super) struct MemoryProfileStore {
    profiles: Mutex<HashMap<ProfileId, ApplicantProfile>>,
}

impl MemoryProfileStore {
    pub(super) fn register(&self, id: &str) {
        let id = ProfileId(id.to_string());
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(id.clone(), ApplicantProfile::new(id));
    }

    pub(super) fn set_score(&self, id: &str, score: Option<f64>) {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard
            .get_mut(&ProfileId(id.to_string()))
            .expect("profile registered");
        profile.calculated_average_grade = score;
    }
}

impl ProfileStore for MemoryProfileStore {
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
pub(super) struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, ExtractionJob>>,
}

impl JobStore for MemoryJobStore {
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
pub(super) struct MemoryDocumentStore {
    blobs: Mutex<HashMap<DocumentKey, Vec<u8>>>,
    sequence: AtomicU64,
}

impl DocumentStore for MemoryDocumentStore {
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

/// Recognizer returning a fixed transcript for every page.
pub(super) struct ScriptedRecognizer {
    pub(super) text: String,
}

impl ScriptedRecognizer {
    pub(super) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<String, RecognizeError> {
        Ok(self.text.clone())
    }
}

/// Recognizer simulating an engine outage.
pub(super) struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<String, RecognizeError> {
        Err(RecognizeError::EngineUnavailable(
            "scripted outage".to_string(),
        ))
    }
}

struct Gate {
    release: Receiver<()>,
    text: String,
}

/// Recognizer that blocks each page until the test releases it, keyed
/// by page width so completion order is under test control.
#[derive(Default)]
pub(super) struct GatedRecognizer {
    gates: Mutex<HashMap<u32, Gate>>,
}

impl GatedRecognizer {
    pub(super) fn gate(&self, width: u32, text: &str) -> Sender<()> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.gates.lock().expect("gate mutex poisoned").insert(
            width,
            Gate {
                release: rx,
                text: text.to_string(),
            },
        );
        tx
    }
}

impl TextRecognizer for GatedRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognizeError> {
        let gate = self
            .gates
            .lock()
            .expect("gate mutex poisoned")
            .remove(&image.width());
        match gate {
            Some(gate) => {
                gate.release.recv().expect("gate sender alive");
                Ok(gate.text)
            }
            None => Ok(String::new()),
        }
    }
}

pub(super) type MemoryManager<R> =
    ExtractionJobManager<MemoryJobStore, MemoryProfileStore, MemoryDocumentStore, R>;

pub(super) fn build_manager<R>(
    recognizer: Arc<R>,
) -> (MemoryManager<R>, Arc<MemoryProfileStore>)
where
    R: TextRecognizer + 'static,
{
    let profiles = Arc::new(MemoryProfileStore::default());
    let manager = ExtractionJobManager::new(
        Arc::new(MemoryJobStore::default()),
        profiles.clone(),
        Arc::new(MemoryDocumentStore::default()),
        recognizer,
        Duration::from_secs(5),
    );
    (manager, profiles)
}

/// A blank white page encoded as PNG; the width doubles as a handle
/// for [`GatedRecognizer`].
pub(super) fn png_page(side: u32) -> Vec<u8> {
    let page = GrayImage::from_pixel(side, side, image::Luma([255u8]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(page)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("png encodes");
    bytes
}

/// Poll a job until it leaves the pending state.
pub(super) async fn wait_for_terminal<R>(manager: &MemoryManager<R>, id: &JobId) -> JobStatusView
where
    R: TextRecognizer + 'static,
{
    for _ in 0..500 {
        let view = manager
            .status(id)
            .expect("job store reachable")
            .expect("job exists");
        if view != JobStatusView::Pending {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id:?} did not reach a terminal state in time");
}

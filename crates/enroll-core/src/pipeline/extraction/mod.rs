//! Asynchronous extraction of a grade average from an uploaded
//! attestation image: OCR pipeline, job lifecycle, and HTTP surface.

pub mod domain;
pub mod ocr;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{DocumentKey, ExtractionJob, JobId, JobState, JobStatusView};
pub use ocr::{ExtractionError, ExtractionOutcome, TesseractRecognizer, TextRecognizer};
pub use repository::{DocumentStore, DocumentStoreError, JobStore, JobStoreError};
pub use router::extraction_router;
pub use service::{ExtractionJobManager, SubmitError};

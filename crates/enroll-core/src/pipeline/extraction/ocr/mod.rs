//! The synchronous extraction pipeline: normalize → recognize →
//! tokenize → average. The job manager runs this on a blocking worker;
//! the CLI runs it directly over a file.

pub mod grades;
pub mod normalize;
pub mod recognize;

pub use grades::{average, extract_tokens, GradeToken, GRADE_MAX, GRADE_MIN};
pub use normalize::{normalize, NormalizeError};
pub use recognize::{RecognizeError, TesseractRecognizer, TextRecognizer};

/// Result of one pipeline run. `average` is `None` when no grade token
/// was found, which is a content outcome and not a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub tokens: Vec<GradeToken>,
    pub average: Option<f64>,
}

/// Execution errors of the pipeline, tagged by whether a retry could
/// plausibly help. The job manager never retries on its own; the tag
/// exists so callers (and the logs) can tell a transient engine outage
/// from a terminally bad image.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

impl ExtractionError {
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ExtractionError::Recognize(RecognizeError::EngineUnavailable(_))
        )
    }
}

/// Run the full pipeline over raw document bytes.
pub fn extract_average<R>(blob: &[u8], recognizer: &R) -> Result<ExtractionOutcome, ExtractionError>
where
    R: TextRecognizer + ?Sized,
{
    let page = normalize(blob)?;
    let text = recognizer.recognize(&page)?;
    let tokens = extract_tokens(&text);
    let average = average(&tokens);

    tracing::debug!(
        tokens = tokens.len(),
        average = ?average,
        "extraction pipeline finished"
    );

    Ok(ExtractionOutcome { tokens, average })
}

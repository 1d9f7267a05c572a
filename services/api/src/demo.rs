use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use image::GrayImage;

use enroll_core::config::AppConfig;
use enroll_core::error::AppError;
use enroll_core::pipeline::extraction::ocr::{self, RecognizeError};
use enroll_core::pipeline::extraction::{
    ExtractionJobManager, JobId, JobStatusView, TesseractRecognizer, TextRecognizer,
};
use enroll_core::pipeline::profile::ProfileId;
use enroll_core::pipeline::ranking::{
    Application, ApplicationId, ApplicationStatus, AttemptLimiter, FundingBasis, RankingEngine,
    SlotId,
};

use crate::infra::{
    InMemoryApplicationDirectory, InMemoryDocumentStore, InMemoryJobStore, InMemoryProfileStore,
};

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// Path to the attestation image to recognize
    pub(crate) image: PathBuf,
    /// Override the configured recognition binary
    #[arg(long)]
    pub(crate) binary: Option<String>,
    /// Override the configured recognition language
    #[arg(long)]
    pub(crate) language: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Slot identifier the demo applications compete for
    #[arg(long, default_value = "informatics-1")]
    pub(crate) slot: String,
}

/// One-shot run of the OCR pipeline over a file, for operators checking
/// a scan by hand before an applicant uploads it.
pub(crate) fn run_extract(mut args: ExtractArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(binary) = args.binary.take() {
        config.ocr.binary = binary;
    }
    if let Some(language) = args.language.take() {
        config.ocr.language = language;
    }

    let recognizer = TesseractRecognizer::new(&config.ocr);
    let blob = std::fs::read(&args.image)?;
    let outcome = ocr::extract_average(&blob, &recognizer)?;

    if outcome.tokens.is_empty() {
        println!("No grade rows recognized in {}", args.image.display());
        return Ok(());
    }

    println!("Grade tokens ({} found)", outcome.tokens.len());
    for token in &outcome.tokens {
        println!("  {} | {}", token.value, token.line);
    }
    match outcome.average {
        Some(average) => println!("Average grade: {average}"),
        None => println!("Average grade: none"),
    }

    Ok(())
}

/// Recognizer replaying prepared transcripts, one per submitted page.
struct QueueRecognizer {
    transcripts: Mutex<VecDeque<String>>,
}

impl QueueRecognizer {
    fn new(transcripts: &[&str]) -> Self {
        Self {
            transcripts: Mutex::new(
                transcripts.iter().map(|text| text.to_string()).collect(),
            ),
        }
    }
}

impl TextRecognizer for QueueRecognizer {
    fn recognize(&self, _image: &GrayImage) -> Result<String, RecognizeError> {
        Ok(self
            .transcripts
            .lock()
            .expect("transcript mutex poisoned")
            .pop_front()
            .unwrap_or_default())
    }
}

/// End-to-end walkthrough with in-memory stores: extract averages for a
/// few applicants, then rank their applications for one slot.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let slot = SlotId(args.slot);

    println!("Admission pipeline demo");

    let transcripts = [
        "1. алгебра отлично (5)\n2. физика хорошо (4)\n3. химия отлично (5)",
        "1. алгебра хорошо (4)\n2. физика удовл (3)",
        "1. литература отлично (5)\n2. история отлично (5)",
    ];
    let applicants = ["aigerim", "bolat", "camila"];

    let profiles = Arc::new(InMemoryProfileStore::default());
    let directory = Arc::new(InMemoryApplicationDirectory::default());
    let manager = ExtractionJobManager::new(
        Arc::new(InMemoryJobStore::default()),
        profiles.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(QueueRecognizer::new(&transcripts)),
        config.ocr.timeout,
    );
    let engine = RankingEngine::new(directory.clone(), profiles.clone(), Duration::ZERO);
    let limiter = AttemptLimiter::new(directory.clone());

    println!("\nExtraction jobs");
    for name in applicants {
        let Some(profile_id) = profiles.create(Some(name.to_string())) else {
            println!("  {name}: profile already registered");
            continue;
        };

        let job_id = match manager.submit(profile_id, blank_page()) {
            Ok(job_id) => job_id,
            Err(err) => {
                println!("  {name}: submission rejected: {err}");
                continue;
            }
        };

        match wait_for_terminal(&manager, &job_id).await {
            Some(JobStatusView::Succeeded { result }) => match result {
                Some(average) => println!("  {name}: {} -> average {average}", job_id.0),
                None => println!("  {name}: {} -> no grades recognized", job_id.0),
            },
            Some(JobStatusView::Failed { error }) => {
                println!("  {name}: {} -> failed: {error}", job_id.0);
            }
            Some(JobStatusView::Pending) | None => {
                println!("  {name}: {} -> still pending, giving up", job_id.0);
            }
        }
    }

    let now = Utc::now();
    for (index, name) in applicants.iter().enumerate() {
        directory.push(Application {
            id: ApplicationId(format!("app-{:06}", index + 1)),
            applicant: ProfileId(name.to_string()),
            slot: slot.clone(),
            funding_basis: FundingBasis::Budget,
            priority: 1,
            status: ApplicationStatus::Pending,
            created_at: now + chrono::Duration::seconds(index as i64),
        });
    }

    println!("\nLeaderboard for {} (budget)", slot.0);
    match engine.leaderboard(&slot, FundingBasis::Budget) {
        Ok(entries) => {
            for entry in entries {
                let score = entry
                    .score
                    .map(|score| score.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  #{} {} | score {} | priority {} | {}",
                    entry.rank, entry.applicant.0, score, entry.priority, entry.status
                );
            }
        }
        Err(err) => println!("  leaderboard unavailable: {err}"),
    }

    println!("\nAttempt checks");
    for name in ["aigerim", "daniyar"] {
        match limiter.can_submit(&ProfileId(name.to_string()), &slot) {
            Ok(decision) if decision.is_allowed() => {
                println!("  {name}: another application is allowed");
            }
            Ok(_) => println!("  {name}: further applications are blocked"),
            Err(err) => println!("  {name}: check unavailable: {err}"),
        }
    }

    Ok(())
}

fn blank_page() -> Vec<u8> {
    let page = GrayImage::from_pixel(64, 64, image::Luma([255u8]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(page)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("png encodes");
    bytes
}

async fn wait_for_terminal(
    manager: &ExtractionJobManager<
        InMemoryJobStore,
        InMemoryProfileStore,
        InMemoryDocumentStore,
        QueueRecognizer,
    >,
    id: &JobId,
) -> Option<JobStatusView> {
    for _ in 0..200 {
        match manager.status(id) {
            Ok(Some(view)) if view != JobStatusView::Pending => return Some(view),
            Ok(Some(_)) => tokio::time::sleep(Duration::from_millis(25)).await,
            Ok(None) | Err(_) => return None,
        }
    }
    Some(JobStatusView::Pending)
}

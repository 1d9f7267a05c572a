//! Wrapper around the external recognition engine. The engine sits
//! behind a trait so the job manager and the tests can swap in scripted
//! recognizers without a system Tesseract install.

use std::io::Write;
use std::process::Command;

use image::GrayImage;

use crate::config::OcrConfig;

/// Turns a normalized page image into raw multi-line text.
///
/// An empty result is a legitimate outcome (a page with nothing the
/// engine can read), never an error; errors are reserved for the engine
/// itself being unavailable or failing.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecognizeError {
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("recognition engine failed: {0}")]
    Engine(String),
    #[error("scratch file error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Recognizer shelling out to the `tesseract` binary.
///
/// Invoked as `tesseract <image> stdout -l <lang> --psm 4 --oem 3`:
/// page segmentation mode 4 (single column of variable-height rows)
/// matches the tabular layout of attestation scans, and the language
/// must carry the Cyrillic model for this deployment's documents.
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            language: config.language.clone(),
        }
    }

    /// Cheap startup probe so a misconfigured deployment is reported
    /// before the first job fails.
    pub fn engine_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognizeError> {
        let mut scratch = tempfile::Builder::new()
            .prefix("attestation-")
            .suffix(".png")
            .tempfile()?;

        let mut encoded = Vec::new();
        image::DynamicImage::ImageLuma8(image.clone())
            .write_to(
                &mut std::io::Cursor::new(&mut encoded),
                image::ImageFormat::Png,
            )
            .map_err(|err| RecognizeError::Engine(format!("scratch png encode failed: {err}")))?;
        scratch.write_all(&encoded)?;
        scratch.flush()?;

        let output = Command::new(&self.binary)
            .arg(scratch.path())
            .arg("stdout")
            .args(["-l", &self.language, "--psm", "4", "--oem", "3"])
            .output()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    RecognizeError::EngineUnavailable(format!(
                        "'{}' not found on PATH",
                        self.binary
                    ))
                } else {
                    RecognizeError::Engine(err.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognizeError::Engine(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

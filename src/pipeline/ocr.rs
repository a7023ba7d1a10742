//! OCR engines used as a fallback for scanned pages and embedded images.
//!
//! OCR is strictly best-effort: every failure surfaces as an [`OcrError`]
//! that callers log and skip. [`ocr_all`] runs a batch with bounded
//! concurrency and stops issuing new jobs once the engine reports it is
//! unavailable, so a missing `tesseract` binary costs one failed spawn per
//! document rather than one per page.

use crate::config::ReviewConfig;
use crate::error::OcrError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Something that turns an encoded image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Build the engine described by `config`.
pub fn engine_from_config(config: &ReviewConfig) -> Arc<dyn OcrEngine> {
    if config.ocr_enabled {
        Arc::new(TesseractOcr::new(
            config.tesseract_binary.clone(),
            config.ocr_language.clone(),
        ))
    } else {
        Arc::new(DisabledOcr)
    }
}

/// Runs the `tesseract` CLI, feeding the image on stdin.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::Unavailable {
                engine: self.binary.clone(),
                detail: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| OcrError::Failed {
                    engine: self.binary.clone(),
                    detail: format!("writing image to stdin: {e}"),
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::Failed {
                engine: self.binary.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                engine: self.binary.clone(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("tesseract recognised {} chars", text.len());
        Ok(text)
    }
}

/// Engine used when OCR is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Unavailable {
            engine: "disabled".into(),
            detail: "OCR is disabled in the configuration".into(),
        })
    }
}

/// OCR every `(label, image)` pair, keeping input order.
///
/// Returns only the labels whose OCR produced non-empty text. Failures are
/// logged; after the first `Unavailable` the remaining jobs are skipped.
pub async fn ocr_all(
    engine: &Arc<dyn OcrEngine>,
    jobs: Vec<(String, Vec<u8>)>,
    concurrency: usize,
) -> Vec<(String, String)> {
    if jobs.is_empty() {
        return Vec::new();
    }
    let unavailable = Arc::new(AtomicBool::new(false));

    let results: Vec<Option<(String, String)>> = stream::iter(jobs.into_iter().map(|(label, image)| {
        let engine = Arc::clone(engine);
        let unavailable = Arc::clone(&unavailable);
        async move {
            if unavailable.load(Ordering::Relaxed) {
                return None;
            }
            match engine.recognize(&image).await {
                Ok(text) if !text.trim().is_empty() => Some((label, text)),
                Ok(_) => {
                    debug!("OCR of {} returned no text", label);
                    None
                }
                Err(e @ OcrError::Unavailable { .. }) => {
                    if !unavailable.swap(true, Ordering::Relaxed) {
                        warn!("OCR skipped: {}", e);
                    }
                    None
                }
                Err(e) => {
                    warn!("OCR of {} failed: {}", label, e);
                    None
                }
            }
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    results.into_iter().flatten().collect()
}

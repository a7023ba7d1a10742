//! Format dispatch for uploaded documents.
//!
//! The extension alone selects the extractor; content is never sniffed. An
//! unknown extension is rejected before any bytes are read.

use crate::config::ReviewConfig;
use crate::error::DocReviewError;
use crate::output::ExtractedDocument;
use crate::pipeline::docx::extract_docx;
use crate::pipeline::ocr::{engine_from_config, OcrEngine};
use crate::pipeline::pdf::extract_pdf;
use crate::pipeline::sheet::{extract_csv, extract_workbook};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Extractor selected for a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Workbook,
    Csv,
}

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "py", "js", "ts", "json", "html", "css"];
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "ods"];

impl DocumentKind {
    /// Classify by lowercase extension.
    pub fn from_filename(filename: &str) -> Result<Self, DocReviewError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let kind = match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "csv" => Self::Csv,
            e if TEXT_EXTENSIONS.contains(&e) => Self::PlainText,
            e if WORKBOOK_EXTENSIONS.contains(&e) => Self::Workbook,
            _ => {
                return Err(DocReviewError::UnsupportedFileType {
                    filename: filename.to_string(),
                    extension: ext,
                })
            }
        };
        Ok(kind)
    }
}

/// Turns uploaded bytes into reviewable text.
#[derive(Clone)]
pub struct Extractor {
    config: ReviewConfig,
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(config: ReviewConfig) -> Self {
        let ocr = engine_from_config(&config);
        Self { config, ocr }
    }

    /// Use a specific OCR engine instead of the configured one.
    pub fn with_ocr(config: ReviewConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Extract `bytes` according to `filename`'s extension.
    pub async fn extract(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, DocReviewError> {
        let kind = DocumentKind::from_filename(filename)?;
        debug!("Extracting '{}' ({} bytes) as {:?}", filename, bytes.len(), kind);

        let doc = match kind {
            DocumentKind::Pdf => ExtractedDocument {
                text: extract_pdf(filename, bytes, &self.config, &self.ocr).await?,
                images: Vec::new(),
            },
            DocumentKind::Docx => {
                let (text, images) = extract_docx(filename, bytes, &self.config, &self.ocr).await?;
                ExtractedDocument { text, images }
            }
            DocumentKind::PlainText => ExtractedDocument {
                text: String::from_utf8(bytes)
                    .map_err(|e| DocReviewError::extraction(filename, "text", e))?,
                images: Vec::new(),
            },
            DocumentKind::Workbook => ExtractedDocument {
                text: extract_workbook(filename, bytes).await?,
                images: Vec::new(),
            },
            DocumentKind::Csv => ExtractedDocument {
                text: extract_csv(filename, &bytes)?,
                images: Vec::new(),
            },
        };
        Ok(doc)
    }
}

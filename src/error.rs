//! Error types for the edgequake-docreview library.
//!
//! Errors are split by who gets to see them:
//!
//! * [`DocReviewError`] (**fatal**): the request cannot proceed at all
//!   (unsupported upload, corrupt document, no usable connection). Returned
//!   as `Err(DocReviewError)` from the public entry points.
//!
//! * [`OcrError`] (**non-fatal**): the OCR toolchain is missing or choked on
//!   one page/image. Logged and skipped; extraction keeps the text it has.
//!
//! * [`LlmError`] / [`ReplyParseError`] (**non-fatal**): the model
//!   round-trip failed or returned something we cannot coerce. Converted into
//!   the degraded review (see [`crate::output::Review::degraded`]), never
//!   propagated. Only the connection test reports an [`LlmError`].

use edgequake_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying cause attached to extraction failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All fatal errors returned by the edgequake-docreview library.
#[derive(Debug, Error)]
pub enum DocReviewError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The file extension is not one the extractor knows how to read.
    #[error("Unsupported file type '{extension}' for '{filename}'\nSupported: pdf, docx, txt, md, py, js, ts, json, html, css, xlsx, xls, csv")]
    UnsupportedFileType { filename: String, extension: String },

    /// The document structure or text encoding could not be read.
    #[error("Failed to extract {format} content from '{filename}': {source}")]
    Extraction {
        filename: String,
        format: &'static str,
        #[source]
        source: BoxedCause,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium system-wide or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Connection errors ─────────────────────────────────────────────────
    /// Unsupported provider or a missing credential for a provider that needs one.
    #[error("Model connection '{provider}' is not usable: {detail}")]
    ConnectionConfig { provider: String, detail: String },

    /// No active model connection was supplied.
    #[error("No active AI connection found. Configure and activate one first.")]
    NoActiveConnection,

    /// A connection test round-trip failed.
    #[error("Connection test failed for {provider}/{model}: {source}")]
    ConnectionTestFailed {
        provider: String,
        model: String,
        #[source]
        source: LlmError,
    },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// The checklist catalog file could not be read or parsed.
    #[error("Failed to load checklist catalog '{path}': {detail}")]
    CatalogLoad { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocReviewError {
    /// Wrap an underlying parse/decode failure for `filename`.
    pub fn extraction(
        filename: impl Into<String>,
        format: &'static str,
        source: impl Into<BoxedCause>,
    ) -> Self {
        DocReviewError::Extraction {
            filename: filename.into(),
            format,
            source: source.into(),
        }
    }

    /// `true` for errors caused by the uploaded content rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocReviewError::UnsupportedFileType { .. } | DocReviewError::Extraction { .. }
        )
    }
}

/// A non-fatal OCR failure for a single page or embedded image.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// The OCR engine could not be started at all (binary missing, disabled).
    #[error("OCR engine '{engine}' unavailable: {detail}")]
    Unavailable { engine: String, detail: String },

    /// The engine ran but failed on this input.
    #[error("OCR engine '{engine}' failed: {detail}")]
    Failed { engine: String, detail: String },

    /// The page could not be rasterised for OCR.
    #[error("Page {page}: rasterisation for OCR failed: {detail}")]
    Render { page: usize, detail: String },
}

/// The model's reply could not be coerced into the review schema.
#[derive(Debug, Error)]
pub enum ReplyParseError {
    #[error("model reply contains no JSON object")]
    NoJsonObject,

    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model reply has unexpected shape: {0}")]
    UnexpectedShape(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_file_type_display() {
        let e = DocReviewError::UnsupportedFileType {
            filename: "setup.exe".into(),
            extension: "exe".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'exe'"), "got: {msg}");
        assert!(msg.contains("setup.exe"));
        assert!(e.is_client_error());
    }

    #[test]
    fn extraction_keeps_source() {
        let cause = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let e = DocReviewError::extraction("notes.txt", "text", cause);
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().contains("notes.txt"));
    }

    #[test]
    fn connection_test_failure_keeps_provider_error() {
        let e = DocReviewError::ConnectionTestFailed {
            provider: "openai".into(),
            model: "gpt-4o".into(),
            source: LlmError::AuthError("invalid key".into()),
        };
        assert!(e.to_string().contains("openai/gpt-4o"));
        assert!(e.to_string().contains("invalid key"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn connection_errors_are_not_client_errors() {
        assert!(!DocReviewError::NoActiveConnection.is_client_error());
        let e = DocReviewError::ConnectionConfig {
            provider: "anthropic".into(),
            detail: "unsupported provider".into(),
        };
        assert!(e.to_string().contains("anthropic"));
    }
}

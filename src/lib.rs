//! # edgequake-docreview
//!
//! Score uploaded documents against named checklists using an LLM.
//!
//! ## Why this crate?
//!
//! Reviewing a project charter or a test plan against a house checklist is
//! tedious and inconsistent when done by hand. This crate turns the document
//! into plain text (with OCR for scanned pages and embedded images), asks a
//! model to evaluate every checklist item, and reduces the verdicts to a
//! transparent 0–100 score.
//!
//! ## Pipeline Overview
//!
//! ```text
//! (filename, bytes)
//!  │
//!  ├─ 1. Extract  pdf / docx / text / spreadsheet, OCR fallback
//!  ├─ 2. Prompt   auditor system prompt + target checklist + document
//!  ├─ 3. Model    one edgequake-llm call to openai / ollama / gemini (no retries)
//!  ├─ 4. Parse    tolerant JSON coercion, degraded review on failure
//!  └─ 5. Score    Pass 1, Warning ½, Fail 0, N/A excluded
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docreview::{
//!     AnalysisRequest, ChecklistCatalog, ConnectionSettings, ReviewConfig, ReviewEngine,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(ChecklistCatalog::from_path("checklists.json")?);
//!     let engine = ReviewEngine::new(catalog, ReviewConfig::default());
//!
//!     let bytes = std::fs::read("charter.docx")?;
//!     let doc = engine.extract("charter.docx", bytes).await?;
//!
//!     let request = AnalysisRequest::new(doc.text)
//!         .with_images(doc.images)
//!         .with_category("Project Charter");
//!     let active = ConnectionSettings::new("ollama", "llama3");
//!     let review = engine.analyze(&request, Some(&active)).await?;
//!     println!("score: {}", review.score);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docreview` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## External tools
//!
//! PDF parsing binds the pdfium shared library (`PDFIUM_LIB_PATH` or the
//! system library). OCR shells out to `tesseract`; when it is missing, OCR is
//! skipped with a warning and extraction keeps whatever text it already has.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod review;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{Category, ChecklistCatalog, ChecklistItem};
pub use config::{ConnectionSettings, Provider, ReviewConfig, ReviewConfigBuilder};
pub use error::{DocReviewError, OcrError, ReplyParseError};
pub use output::{AnalysisRequest, ExtractedDocument, Review, ReviewItem, ReviewStatus};
pub use pipeline::extract::{DocumentKind, Extractor};
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use pipeline::score::{score, ScoreBreakdown};
pub use provider::connect;
pub use review::ReviewEngine;

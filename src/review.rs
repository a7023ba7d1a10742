//! Review entry points.
//!
//! [`ReviewEngine`] ties the pipeline stages to an injected, read-only
//! [`ChecklistCatalog`]. It holds no per-request state, so one engine can
//! serve concurrent analyses; clone it cheaply or share it behind an `Arc`.

use crate::catalog::ChecklistCatalog;
use crate::config::{ConnectionSettings, ReviewConfig};
use crate::error::DocReviewError;
use crate::output::{AnalysisRequest, ExtractedDocument, Review};
use crate::pipeline::extract::Extractor;
use crate::pipeline::llm::run_review;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::request::build_review_messages;
use crate::prompts::CONNECTION_TEST_PROMPT;
use crate::provider::{chat_once, connect, ping_options, review_options};
use edgequake_llm::{ChatMessage, LLMProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Extracts documents and reviews them against the checklist catalog.
#[derive(Clone)]
pub struct ReviewEngine {
    catalog: Arc<ChecklistCatalog>,
    extractor: Extractor,
    config: ReviewConfig,
}

impl ReviewEngine {
    pub fn new(catalog: Arc<ChecklistCatalog>, config: ReviewConfig) -> Self {
        Self {
            catalog,
            extractor: Extractor::new(config.clone()),
            config,
        }
    }

    /// Same as [`ReviewEngine::new`] with an explicit OCR engine.
    pub fn with_ocr(
        catalog: Arc<ChecklistCatalog>,
        config: ReviewConfig,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            catalog,
            extractor: Extractor::with_ocr(config.clone(), ocr),
            config,
        }
    }

    pub fn catalog(&self) -> &ChecklistCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Convert an uploaded document into text (and any kept images).
    pub async fn extract(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedDocument, DocReviewError> {
        self.extractor.extract(filename, bytes).await
    }

    /// Review `request` using the active connection.
    ///
    /// # Errors
    /// Only configuration problems are errors: no active connection, an
    /// unsupported provider, or a missing credential. Model call failures
    /// yield a degraded [`Review`].
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        active: Option<&ConnectionSettings>,
    ) -> Result<Review, DocReviewError> {
        let settings = active.ok_or(DocReviewError::NoActiveConnection)?;
        let llm = connect(settings, &self.config)?;
        Ok(self.analyze_with(request, llm.as_ref()).await)
    }

    /// Review `request` with an already-built provider.
    pub async fn analyze_with(&self, request: &AnalysisRequest, llm: &dyn LLMProvider) -> Review {
        let checklist = request
            .document_category
            .as_deref()
            .map(|c| self.catalog.items_for(c))
            .unwrap_or(&[]);
        if let Some(category) = request.document_category.as_deref() {
            if checklist.is_empty() {
                debug!("Category '{}' has no checklist; reviewing without one", category);
            }
        }
        info!(
            "Reviewing {} chars against {} checklist items with {}/{}",
            request.text.chars().count(),
            checklist.len(),
            llm.name(),
            llm.model()
        );

        let messages = build_review_messages(
            llm.model(),
            &request.text,
            &request.custom_instructions,
            checklist,
            &request.images,
            &self.config,
        );
        run_review(
            llm,
            &messages,
            &review_options(&self.config),
            self.config.request_timeout(),
        )
        .await
    }

    /// Send a minimal prompt to verify `settings` before activating them.
    pub async fn test_connection(&self, settings: &ConnectionSettings) -> Result<(), DocReviewError> {
        let llm = connect(settings, &self.config)?;
        ping(llm.as_ref(), self.config.request_timeout()).await
    }
}

/// One tiny round-trip; any failure is reported, never degraded.
pub async fn ping(llm: &dyn LLMProvider, timeout: Option<Duration>) -> Result<(), DocReviewError> {
    let messages = [ChatMessage::user(CONNECTION_TEST_PROMPT)];
    chat_once(llm, &messages, &ping_options(), timeout)
        .await
        .map_err(|source| DocReviewError::ConnectionTestFailed {
            provider: llm.name().to_string(),
            model: llm.model().to_string(),
            source,
        })?;
    info!("Connection {}/{} OK", llm.name(), llm.model());
    Ok(())
}

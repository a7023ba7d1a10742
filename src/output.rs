//! Public data types produced and consumed by the review pipeline.

use serde::{Deserialize, Serialize};

/// Item name used by the synthetic entry of a degraded review.
pub const DEGRADED_ITEM: &str = "AI Analysis";

/// The single suggestion carried by a degraded review.
pub const DEGRADED_SUGGESTION: &str = "Check configuration and try again.";

/// Text (and optionally images) extracted from one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Plain text, including any OCR output fused under labelled markers.
    pub text: String,
    /// Base64-encoded image blobs (only populated when
    /// [`crate::ReviewConfig::keep_embedded_images`] is set).
    #[serde(default)]
    pub images: Vec<String>,
}

/// What the caller asks the model to review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Extracted document text.
    pub text: String,
    /// Base64 images (raw or `data:` URIs), attached only for vision models.
    #[serde(default)]
    pub images: Vec<String>,
    /// Free-text instructions from the user.
    #[serde(default)]
    pub custom_instructions: String,
    /// Checklist category to evaluate against.
    #[serde(default)]
    pub document_category: Option<String>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.document_category = Some(category.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = instructions.into();
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// Verdict for one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pass,
    Fail,
    Warning,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
}

impl ReviewStatus {
    /// Classify a free-text status from the model.
    ///
    /// Case-insensitive substring matching, checked in this order:
    /// "not applicable"/"n/a", then "pass", then "warning", else `Fail`.
    /// The order matters: "N/A - pass not required" is `NotApplicable`.
    pub fn classify(raw: &str) -> Self {
        let s = raw.to_lowercase();
        if s.contains("not applicable") || s.contains("n/a") {
            ReviewStatus::NotApplicable
        } else if s.contains("pass") {
            ReviewStatus::Pass
        } else if s.contains("warning") {
            ReviewStatus::Warning
        } else {
            ReviewStatus::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pass => "Pass",
            ReviewStatus::Fail => "Fail",
            ReviewStatus::Warning => "Warning",
            ReviewStatus::NotApplicable => "Not Applicable",
        }
    }
}

/// One evaluated checklist entry, coerced from the model's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub section: String,
    pub item: String,
    pub status: ReviewStatus,
    pub comment: String,
}

/// The final structured result of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub checklist: Vec<ReviewItem>,
    pub suggestions: Vec<String>,
    pub rewritten_content: Option<String>,
    /// 0–100, derived from `checklist` statuses only.
    pub score: u8,
}

impl Review {
    /// The fixed fallback review emitted when the model round-trip fails.
    pub fn degraded(message: impl std::fmt::Display) -> Self {
        Self {
            checklist: vec![ReviewItem {
                section: String::new(),
                item: DEGRADED_ITEM.to_string(),
                status: ReviewStatus::Fail,
                comment: format!("Error: {message}"),
            }],
            suggestions: vec![DEGRADED_SUGGESTION.to_string()],
            rewritten_content: Some(String::new()),
            score: 0,
        }
    }

    /// Whether this is the synthetic review produced by [`Review::degraded`].
    pub fn is_degraded(&self) -> bool {
        self.score == 0
            && self.checklist.len() == 1
            && self.checklist[0].item == DEGRADED_ITEM
            && self.checklist[0].status == ReviewStatus::Fail
            && self.checklist[0].comment.starts_with("Error: ")
    }
}

//! Configuration types for extraction and review.
//!
//! All pipeline behaviour is controlled through [`ReviewConfig`], built via
//! its [`ReviewConfigBuilder`]. The model connection itself is *not* part of
//! the config: it is owned by an external store and handed in per request as
//! [`ConnectionSettings`].

use crate::error::DocReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default markers for vision-capable model identifiers.
pub const DEFAULT_VISION_MARKERS: &[&str] = &["gpt-4o", "gemini-1.5", "llava", "vision"];

/// Configuration for extraction, prompting and model calls.
///
/// # Example
/// ```rust
/// use edgequake_docreview::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .ocr_min_chars_per_page(150)
///     .temperature(0.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_min_chars_per_page, 150);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// PDF text below `pages × ocr_min_chars_per_page` characters triggers
    /// the OCR fallback. Default: 100.
    ///
    /// Scanned PDFs usually carry no text layer at all, while digital PDFs
    /// average well above a thousand characters per page. The exact cut-off
    /// is empirical, hence configurable.
    pub ocr_min_chars_per_page: usize,

    /// Case-insensitive substrings that mark a model as accepting image input.
    pub vision_model_markers: Vec<String>,

    /// Run OCR at all. Default: true.
    pub ocr_enabled: bool,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu". Default: "eng".
    pub ocr_language: String,

    /// Name or path of the tesseract executable. Default: "tesseract".
    pub tesseract_binary: String,

    /// Number of OCR jobs in flight per document. Default: 4.
    pub ocr_concurrency: usize,

    /// Longest edge in pixels when rasterising PDF pages for OCR. Default: 2000.
    pub render_max_pixels: u32,

    /// Also return embedded DOCX images base64-encoded. Default: false.
    pub keep_embedded_images: bool,

    /// Sampling temperature. Default: 0.0 (reviews should be reproducible).
    pub temperature: f32,

    /// Upper bound on generated tokens. Default: provider default.
    pub max_tokens: Option<usize>,

    /// Ask the provider for JSON-only output where supported. Default: true.
    pub json_mode: bool,

    /// Upper bound on one model call. Default: none beyond the provider client's own.
    pub request_timeout_secs: Option<u64>,

    /// Base URL of the local Ollama server. Default: `http://localhost:11434`.
    pub ollama_base_url: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            ocr_min_chars_per_page: 100,
            vision_model_markers: DEFAULT_VISION_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            ocr_enabled: true,
            ocr_language: "eng".to_string(),
            tesseract_binary: "tesseract".to_string(),
            ocr_concurrency: 4,
            render_max_pixels: 2000,
            keep_embedded_images: false,
            temperature: 0.0,
            max_tokens: None,
            json_mode: true,
            request_timeout_secs: None,
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `model` is heuristically recognised as vision-capable.
    pub fn supports_vision(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        self.vision_model_markers
            .iter()
            .any(|m| model.contains(&m.to_lowercase()))
    }

    /// Upper bound for one model call, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn ocr_min_chars_per_page(mut self, n: usize) -> Self {
        self.config.ocr_min_chars_per_page = n;
        self
    }

    pub fn vision_model_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.vision_model_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_binary(mut self, bin: impl Into<String>) -> Self {
        self.config.tesseract_binary = bin.into();
        self
    }

    pub fn ocr_concurrency(mut self, n: usize) -> Self {
        self.config.ocr_concurrency = n.max(1);
        self
    }

    pub fn render_max_pixels(mut self, px: u32) -> Self {
        self.config.render_max_pixels = px.max(100);
        self
    }

    pub fn keep_embedded_images(mut self, v: bool) -> Self {
        self.config.keep_embedded_images = v;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn json_mode(mut self, v: bool) -> Self {
        self.config.json_mode = v;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn ollama_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.ollama_base_url = url.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, DocReviewError> {
        let c = &self.config;
        if c.ocr_concurrency == 0 {
            return Err(DocReviewError::InvalidConfig(
                "OCR concurrency must be ≥ 1".into(),
            ));
        }
        if c.ocr_enabled && c.ocr_language.trim().is_empty() {
            return Err(DocReviewError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.max_tokens == Some(0) {
            return Err(DocReviewError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if !c.ollama_base_url.starts_with("http://") && !c.ollama_base_url.starts_with("https://")
        {
            return Err(DocReviewError::InvalidConfig(format!(
                "Ollama base URL must be http(s), got '{}'",
                c.ollama_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Connections ──────────────────────────────────────────────────────────

/// Model provider families the review pipeline can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI or any OpenAI-compatible endpoint.
    OpenAi,
    /// A local Ollama server.
    Ollama,
    /// Google Gemini through the Google AI API.
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Ollama => "ollama",
            Provider::Gemini => "gemini",
        }
    }

    /// Whether this provider refuses to work without an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DocReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(DocReviewError::ConnectionConfig {
                provider: other.to_string(),
                detail: "unsupported provider (expected openai, ollama or gemini)".into(),
            }),
        }
    }
}

/// The resolved "active" connection record handed in by the external store.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Display name of the stored connection.
    #[serde(default)]
    pub name: Option<String>,
    /// Provider name, e.g. "openai", "ollama", "gemini".
    pub provider: String,
    /// Model identifier passed to the provider.
    pub model_name: String,
    /// Credential; required for openai and gemini.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Endpoint override: an OpenAI-compatible base URL or the Ollama host.
    /// Gemini always uses the Google AI endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ConnectionSettings {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// The API key, treating an empty string as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

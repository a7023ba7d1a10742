//! Model connections on top of `edgequake-llm`.
//!
//! ```text
//! ConnectionSettings ──connect()──▶ Arc<dyn LLMProvider>
//!                                    ├─ OpenAIProvider  (api.openai.com or any compatible base_url)
//!                                    ├─ OllamaProvider  (ollama_base_url or base_url)
//!                                    └─ GeminiProvider  (Google AI key)
//! ```
//!
//! The review pipeline only sees `dyn LLMProvider`, so adding a provider is
//! one more arm in [`connect`].

use crate::config::{ConnectionSettings, Provider, ReviewConfig};
use crate::error::DocReviewError;
use edgequake_llm::{
    ChatMessage, CompletionOptions, GeminiProvider, LLMProvider, LLMResponse, LlmError,
    OllamaProvider, OpenAIProvider,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Token budget for the connection test reply.
const PING_MAX_TOKENS: usize = 16;

/// Validate `settings` and build the matching provider.
///
/// Fails with [`DocReviewError::ConnectionConfig`] before any network I/O when
/// the provider is unknown, the model is blank, or a required key is missing.
pub fn connect(
    settings: &ConnectionSettings,
    config: &ReviewConfig,
) -> Result<Arc<dyn LLMProvider>, DocReviewError> {
    let provider: Provider = settings.provider.parse()?;

    let model = settings.model_name.trim();
    if model.is_empty() {
        return Err(DocReviewError::ConnectionConfig {
            provider: provider.to_string(),
            detail: "model name is required".into(),
        });
    }

    let api_key = settings.api_key();
    if provider.requires_api_key() && api_key.is_none() {
        return Err(DocReviewError::ConnectionConfig {
            provider: provider.to_string(),
            detail: format!("an API key is required for {provider}"),
        });
    }
    let api_key = api_key.unwrap_or_default();
    let base_url = settings
        .base_url
        .as_deref()
        .map(|u| u.trim().trim_end_matches('/'))
        .filter(|u| !u.is_empty());

    debug!("Connecting to {}/{}", provider, model);
    let llm: Arc<dyn LLMProvider> = match provider {
        Provider::OpenAi => {
            let client = match base_url {
                Some(url) => OpenAIProvider::compatible(api_key, url),
                None => OpenAIProvider::new(api_key),
            };
            Arc::new(client.with_model(model))
        }
        Provider::Ollama => {
            let host = base_url.unwrap_or(config.ollama_base_url.as_str());
            let client = OllamaProvider::builder()
                .host(host)
                .model(model)
                .build()
                .map_err(|e| DocReviewError::ConnectionConfig {
                    provider: provider.to_string(),
                    detail: e.to_string(),
                })?;
            Arc::new(client)
        }
        Provider::Gemini => {
            if let Some(url) = base_url {
                debug!("Gemini uses the Google AI endpoint; ignoring base_url {}", url);
            }
            Arc::new(GeminiProvider::new(api_key).with_model(model))
        }
    };
    Ok(llm)
}

/// Options for a review call, taken from the config.
pub fn review_options(config: &ReviewConfig) -> CompletionOptions {
    let base = if config.json_mode {
        CompletionOptions::json_mode()
    } else {
        CompletionOptions::default()
    };
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        ..base
    }
}

/// Options for the connection test: plain text, a handful of tokens.
pub fn ping_options() -> CompletionOptions {
    CompletionOptions {
        temperature: Some(0.0),
        max_tokens: Some(PING_MAX_TOKENS),
        ..Default::default()
    }
}

/// One chat call, bounded by `timeout` when set.
pub async fn chat_once(
    llm: &dyn LLMProvider,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    timeout: Option<Duration>,
) -> Result<LLMResponse, LlmError> {
    let call = llm.chat(messages, Some(options));
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| LlmError::Timeout)?,
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn connect_rejects_unknown_provider() {
        let err = connect(
            &ConnectionSettings::new("anthropic", "claude"),
            &ReviewConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DocReviewError::ConnectionConfig { .. }));
    }

    #[test]
    fn connect_requires_key_for_hosted_providers() {
        let config = ReviewConfig::default();
        for provider in ["openai", "gemini"] {
            let err = connect(&ConnectionSettings::new(provider, "m"), &config)
                .err()
                .unwrap();
            assert!(err.to_string().contains("API key"), "got: {err}");
        }
    }

    #[test]
    fn connect_ollama_without_key() {
        let llm = connect(
            &ConnectionSettings::new("ollama", "llama3"),
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(llm.model(), "llama3");
    }

    #[test]
    fn connect_builds_hosted_providers_with_key() {
        let config = ReviewConfig::default();
        let openai = connect(
            &ConnectionSettings::new("OpenAI", "gpt-4o-mini")
                .with_api_key("sk-test")
                .with_base_url("http://localhost:8000/v1/"),
            &config,
        )
        .unwrap();
        assert_eq!(openai.model(), "gpt-4o-mini");

        let gemini = connect(
            &ConnectionSettings::new("google", "gemini-1.5-flash").with_api_key("key"),
            &config,
        )
        .unwrap();
        assert_eq!(gemini.model(), "gemini-1.5-flash");
    }

    #[test]
    fn connect_rejects_blank_model() {
        let err = connect(
            &ConnectionSettings::new("ollama", "  "),
            &ReviewConfig::default(),
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("model name"));
    }

    #[test]
    fn review_options_follow_config() {
        let config = ReviewConfig::builder().max_tokens(2048).build().unwrap();
        let opts = review_options(&config);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(2048));
        assert_eq!(opts.response_format.as_deref(), Some("json_object"));

        let plain = ReviewConfig::builder().json_mode(false).build().unwrap();
        assert!(review_options(&plain).response_format.is_none());
    }

    #[test]
    fn ping_options_are_plain_text() {
        let opts = ping_options();
        assert_eq!(opts.max_tokens, Some(16));
        assert!(opts.response_format.is_none());
    }

    struct Stalled;

    #[async_trait]
    impl LLMProvider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn model(&self) -> &str {
            "stalled"
        }

        fn max_context_length(&self) -> usize {
            4096
        }

        async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            self.complete_with_options(prompt, &CompletionOptions::default())
                .await
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            self.chat(&[ChatMessage::user(prompt)], Some(options)).await
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(LLMResponse::new("late", "stalled"))
        }
    }

    #[tokio::test]
    async fn chat_once_enforces_timeout() {
        let err = chat_once(
            &Stalled,
            &[ChatMessage::user("hi")],
            &ping_options(),
            Some(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LlmError::Timeout));
    }
}

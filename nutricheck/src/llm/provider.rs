use std::sync::Arc;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{CheckError, Result};
use crate::llm::api::{provider_base_url, ChatClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

impl CompletionOptions {
    /// Greedy decoding for reproducible extraction.
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            temperature: Some(0.0),
            max_tokens: Some(max_tokens),
            stop: None,
        }
    }
}

#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<Arc<LlmConfig>>,
    client: Option<ChatClient>,
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("backend", &self.backend)
            .field("model", &self.config.as_ref().map(|c| c.model.as_str()))
            .finish()
    }
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    LlmBackend::Unavailable {
                        reason: format!("Unknown provider in model: {}", config.model),
                    }
                }
            }
        };

        // The client is built once so its HTTP pool is reused across calls.
        let (backend, client) = match backend {
            LlmBackend::Unavailable { .. } => (backend, None),
            available => match ChatClient::new(config) {
                Ok(client) => (available, Some(client)),
                Err(e) => (
                    LlmBackend::Unavailable {
                        reason: e.to_string(),
                    },
                    None,
                ),
            },
        };

        Self {
            backend,
            config: Some(Arc::new(config.clone())),
            client,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_deref()
    }

    pub fn base_url(&self) -> Option<&str> {
        match &self.backend {
            LlmBackend::Unavailable { .. } => None,
            LlmBackend::OpenAICompatible { base_url } => Some(base_url),
            _ => Some(
                self.client
                    .as_ref()
                    .map(ChatClient::base_url)
                    .unwrap_or_else(|| {
                        let model = self.config().map(|c| c.model.as_str()).unwrap_or_default();
                        provider_base_url(parse_llm_provider_model(model).0)
                    }),
            ),
        }
    }

    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: Option<&CompletionOptions>,
    ) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .filter(|_| self.is_available())
            .ok_or_else(|| CheckError::LlmUnavailable(self.unavailable_reason()))?;

        let defaults = CompletionOptions::default();
        client
            .complete(system_prompt, prompt, options.unwrap_or(&defaults))
            .await
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client is not initialized".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(model: &str) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
        }
    }

    #[test]
    fn test_missing_key_makes_provider_unavailable() {
        let config = LlmConfig {
            api_key: None,
            ..llm_config("openai/gpt-4o-mini")
        };
        let provider = LlmProvider::new(Some(&config));
        assert!(!provider.is_available());
        assert!(provider.base_url().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_provider_fails_fast() {
        let provider = LlmProvider::new(None);
        let err = provider.complete("hello", None, None).await.unwrap_err();
        assert!(matches!(err, CheckError::LlmUnavailable(_)));
    }

    #[test]
    fn test_custom_base_url_backend() {
        let config = LlmConfig {
            base_url: Some("http://models.internal/v1".to_string()),
            ..llm_config("biogpt-large")
        };
        let provider = LlmProvider::new(Some(&config));
        assert_eq!(
            provider.backend(),
            &LlmBackend::OpenAICompatible {
                base_url: "http://models.internal/v1".to_string()
            }
        );
        assert_eq!(provider.base_url(), Some("http://models.internal/v1"));
    }
}

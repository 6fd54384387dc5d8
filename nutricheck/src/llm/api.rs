//! Chat completions against any OpenAI-compatible endpoint.
//!
//! Claim extraction and term enrichment both send one system message and one
//! user message and read back a single text answer. Failures are sorted into
//! the crate's error taxonomy: throttling, rejected credentials, timeouts, and
//! transient faults that are worth another attempt.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, Stop,
    },
    Client,
};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{CheckError, Result},
    llm::provider::CompletionOptions,
};

/// Default endpoints of the hosted and local providers we know by name.
const PROVIDER_BASE_URLS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("lmstudio", "http://localhost:1234/v1"),
];

/// Providers that run on the user's machine and take no API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "lmstudio", "local"];

const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Endpoint for a provider prefix, falling back to OpenAI.
pub(crate) fn provider_base_url(provider: &str) -> &'static str {
    let provider = provider.to_lowercase();
    PROVIDER_BASE_URLS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, url)| *url)
        .unwrap_or(PROVIDER_BASE_URLS[0].1)
}

/// How a failed completion should be handled.
#[derive(Debug)]
enum Failure {
    /// Another attempt may succeed.
    Transient(CheckError),
    /// Retrying cannot help.
    Permanent(CheckError),
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client<OpenAIConfig>,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (provider, model) = parse_llm_provider_model(&config.model);
        let keyless = KEYLESS_PROVIDERS.contains(&provider.to_lowercase().as_str());

        let api_key = match (&config.api_key, keyless) {
            (Some(key), _) => key.clone(),
            (None, true) => String::new(),
            (None, false) => {
                return Err(CheckError::Llm(format!(
                    "API key required for provider '{provider}'"
                )))
            }
        };

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| provider_base_url(provider).to_string());

        // Unprefixed names go to the endpoint unchanged.
        let model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        let timeout = Duration::from_secs(config.timeout_secs);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::Llm(format!("Failed to create LLM HTTP client: {e}")))?;

        // async-openai retries 5xx and throttling internally; cap that at
        // the request timeout so a dead endpoint fails within budget.
        let internal_backoff = ExponentialBackoff {
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(base_url.clone())
                .with_api_key(api_key),
        )
        .with_http_client(http_client)
        .with_backoff(internal_backoff);

        Ok(Self {
            client,
            base_url,
            model,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` (with an optional system message) and return the text
    /// of the first choice.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(CheckError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.request(system, prompt, options)?;
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(RETRY_BASE_DELAY)
            .with_max_interval(RETRY_MAX_DELAY)
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0;
        loop {
            let error = match self.client.chat().create(request.clone()).await {
                Ok(response) => return first_choice_text(response),
                Err(e) => classify(e),
            };

            let error = match error {
                Failure::Transient(e) if attempt < self.max_retries => e,
                Failure::Transient(e) | Failure::Permanent(e) => return Err(e),
            };

            attempt += 1;
            let delay = backoff.next_backoff().unwrap_or(RETRY_MAX_DELAY);
            tracing::warn!(
                model = %self.model,
                attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying LLM completion"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn request(
        &self,
        system: Option<&str>,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let invalid = |e: OpenAIError| CheckError::Validation(format!("Invalid LLM request: {e}"));

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(invalid)?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(invalid)?
                .into(),
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone()).messages(messages);
        if let Some(temperature) = options.temperature {
            args.temperature(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            args.max_tokens(max_tokens);
        }
        if let Some(stop) = options.stop.as_ref().filter(|s| !s.is_empty()) {
            args.stop(Stop::StringArray(stop.clone()));
        }

        args.build().map_err(invalid)
    }
}

fn first_choice_text(response: CreateChatCompletionResponse) -> Result<String> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CheckError::Llm("LLM returned no text".to_string()));
    }
    Ok(text)
}

fn classify(error: OpenAIError) -> Failure {
    match error {
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            Failure::Transient(CheckError::Timeout(format!("LLM request timed out: {e}")))
        }
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Failure::Permanent(CheckError::LlmRateLimit { retry_after: None })
            }
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                Failure::Permanent(CheckError::Llm(format!("LLM authentication failed: {e}")))
            }
            Some(status) if !status.is_server_error() => {
                Failure::Permanent(CheckError::Llm(format!("LLM request failed: {e}")))
            }
            _ => Failure::Transient(CheckError::Llm(format!("LLM request failed: {e}"))),
        },
        OpenAIError::ApiError(api) => classify_api_error(api),
        OpenAIError::JSONDeserialize(e) => {
            Failure::Permanent(CheckError::Llm(format!("Unreadable LLM response: {e}")))
        }
        OpenAIError::InvalidArgument(message) => {
            Failure::Permanent(CheckError::Validation(message))
        }
        other => Failure::Permanent(CheckError::Llm(other.to_string())),
    }
}

/// API errors carry no status, so the kind is read from their type, code and
/// message. Untyped errors come from 5xx bodies and are retried.
fn classify_api_error(api: ApiError) -> Failure {
    let untyped = api.r#type.is_none() && api.code.is_none();
    let haystack = format!(
        "{} {} {}",
        api.r#type.as_deref().unwrap_or_default(),
        api.code.as_deref().unwrap_or_default(),
        api.message
    )
    .to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    if mentions(&["rate_limit", "rate limit", "too many requests", "insufficient_quota"]) {
        Failure::Permanent(CheckError::LlmRateLimit { retry_after: None })
    } else if mentions(&["invalid_api_key", "invalid api key", "authentication", "unauthorized"]) {
        Failure::Permanent(CheckError::Llm(format!("LLM authentication failed: {api}")))
    } else if untyped {
        Failure::Transient(CheckError::Llm(format!("LLM API error: {api}")))
    } else {
        Failure::Permanent(CheckError::Llm(format!("LLM API error: {api}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> LlmConfig {
        LlmConfig {
            model: model.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
        }
    }

    fn api_error(kind: Option<&str>, code: Option<&str>, message: &str) -> ApiError {
        ApiError {
            message: message.to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let client = ChatClient::new(&config("ollama/llama3")).expect("client");
        assert_eq!(client.base_url(), "http://localhost:11434/v1");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_hosted_provider_requires_key() {
        let err = ChatClient::new(&config("openai/gpt-4o-mini")).err();
        assert!(matches!(err, Some(CheckError::Llm(msg)) if msg.contains("openai")));
    }

    #[test]
    fn test_unknown_provider_defaults_to_openai() {
        assert_eq!(provider_base_url("LMStudio"), "http://localhost:1234/v1");
        assert_eq!(provider_base_url("somewhere"), "https://api.openai.com/v1");
    }

    #[test]
    fn test_request_carries_system_message_and_options() {
        let client = ChatClient::new(&config("ollama/llama3")).unwrap();
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(64),
            stop: Some(vec![]),
        };

        let request = client
            .request(Some("You extract claims."), "claim text", &options)
            .expect("request");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model, "llama3");
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.stop.is_none());

        let request = client
            .request(Some("   "), "claim text", &CompletionOptions::default())
            .unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_api_errors_are_classified() {
        let quota = api_error(
            Some("insufficient_quota"),
            Some("insufficient_quota"),
            "You exceeded your quota",
        );
        assert!(matches!(
            classify_api_error(quota),
            Failure::Permanent(CheckError::LlmRateLimit { retry_after: None })
        ));

        let auth = api_error(Some("invalid_request_error"), Some("invalid_api_key"), "Bad key");
        assert!(matches!(
            classify_api_error(auth),
            Failure::Permanent(CheckError::Llm(msg)) if msg.contains("authentication failed")
        ));

        let outage = api_error(None, None, "upstream temporary failure");
        assert!(matches!(classify_api_error(outage), Failure::Transient(_)));

        let bad_model = api_error(Some("invalid_request_error"), Some("model_not_found"), "No model");
        assert!(matches!(classify_api_error(bad_model), Failure::Permanent(_)));
    }
}

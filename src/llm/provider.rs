//! LLM call layer: a single structured-call primitive with JSON
//! sanitization and a static per-model fallback chain.
//!
//! `HttpLlmProvider` speaks a generic OpenAI-compatible chat-completions
//! HTTP contract: bearer auth, a JSON body of model/messages/temperature,
//! and a `choices[0].message.content` response. `generate_structured` wraps
//! any `LlmProvider` with decode-with-fallback: try the requested model,
//! decode its response as JSON, and on either a transport or decode failure
//! step down the model's fallback chain before giving up.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::llm::json_utils::decode_structured;
use crate::llm::router::ModelRouterConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to model '{model}' failed: {message}")]
    Request { model: String, message: String },
    #[error("model '{model}' returned a response that could not be decoded as the expected shape: {source}")]
    Decode { model: String, #[source] source: serde_json::Error },
    #[error("call to model '{model}' timed out after {elapsed_ms} ms")]
    Timeout { model: String, elapsed_ms: u64 },
    #[error("all models in the fallback chain starting at '{primary}' failed; last error: {last}")]
    ChainExhausted { primary: String, last: String },
}

/// Raw text completion primitive. Implementations must be side-effect free
/// besides logs and safe to call concurrently (no shared mutable state).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str, temperature: f32, max_tokens: u32) -> Result<RawCompletion, LlmError>;
}

pub struct RawCompletion {
    pub text: String,
    pub token_count: Option<u64>,
}

/// Generic OpenAI-compatible chat-completions client: bearer-auth POST,
/// JSON body, reads `choices[0].message.content` and (when present)
/// `usage.total_tokens`.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpLlmProvider {
    pub fn new(base_url: String, api_key: String, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("reqwest client builds with a finite timeout");
        Self { client, base_url, api_key }
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn complete(&self, model: &str, prompt: &str, temperature: f32, max_tokens: u32) -> Result<RawCompletion, LlmError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
            "max_tokens": max_tokens,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Request { model: model.to_string(), message: source.to_string() })?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|source| LlmError::Request { model: model.to_string(), message: source.to_string() })?;

        let text = value["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string();
        let token_count = value["usage"]["total_tokens"].as_u64();

        Ok(RawCompletion { text, token_count })
    }
}

/// `generateStructured(prompt, modelConfig, schema, ...) -> {data, tokenCount?}`.
/// `T` stands in for the schema: a typed struct the caller expects back.
pub struct GeneratedStructured<T> {
    pub data: T,
    pub token_count: Option<u64>,
    pub model_used: String,
    pub fallback_depth: u32,
}

/// Build a provider request, decode its JSON response into `T`, and retry
/// through the static fallback chain on provider failure or decode failure.
/// First success wins; if every model in the chain is exhausted, the
/// original error from the primary model is surfaced.
pub async fn generate_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    router: &crate::llm::router::ModelRouter,
    config: &ModelRouterConfig,
    prompt: &str,
) -> Result<GeneratedStructured<T>, LlmError> {
    let mut chain = vec![config.model_id.clone()];
    chain.extend(router.fallback_chain(&config.model_id));

    let mut last_error: Option<LlmError> = None;

    for (depth, model) in chain.iter().enumerate() {
        info!(model = %model, depth, "calling llm provider");
        let attempt =
            provider.complete(model, prompt, config.temperature, config.max_output_tokens).await;
        let completion = match attempt {
            Ok(completion) => completion,
            Err(err) => {
                warn!(model = %model, error = %err, "provider call failed, trying next in fallback chain");
                last_error = Some(err);
                continue;
            }
        };

        match decode_structured::<T>(&completion.text) {
            Ok(data) => {
                return Ok(GeneratedStructured {
                    data,
                    token_count: completion.token_count,
                    model_used: model.clone(),
                    fallback_depth: depth as u32,
                });
            }
            Err(source) => {
                warn!(model = %model, error = %source, "response failed structured decode");
                last_error = Some(LlmError::Decode { model: model.clone(), source });
            }
        }
    }

    Err(LlmError::ChainExhausted {
        primary: config.model_id.clone(),
        last: last_error.map(|e| e.to_string()).unwrap_or_else(|| "no models attempted".to_string()),
    })
}

/// Build a plain-text prompt from a serializable request value, used by
/// agents that need to embed a JSON payload inside their prompt body.
pub fn embed_json_context<T: Serialize>(preamble: &str, value: &T) -> String {
    format!("{}\n\n{}", preamble, serde_json::to_string_pretty(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Shape {
        value: i32,
    }

    struct ScriptedProvider {
        responses: Vec<Result<&'static str, &'static str>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, model: &str, _prompt: &str, _t: f32, _m: u32) -> Result<RawCompletion, LlmError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(idx) {
                Some(Ok(text)) => Ok(RawCompletion { text: text.to_string(), token_count: Some(10) }),
                Some(Err(msg)) => {
                    Err(LlmError::Request { model: model.to_string(), message: msg.to_string() })
                }
                None => panic!("no more scripted responses"),
            }
        }
    }

    #[tokio::test]
    async fn first_model_success_returns_immediately() {
        let provider = ScriptedProvider { responses: vec![Ok(r#"{"value": 1}"#)], calls: AtomicUsize::new(0) };
        let router = crate::llm::router::ModelRouter::new();
        let config = ModelRouterConfig { model_id: "no-fallback-model".to_string(), temperature: 0.1, max_output_tokens: 16 };
        let result: GeneratedStructured<Shape> =
            generate_structured(&provider, &router, &config, "prompt").await.unwrap();
        assert_eq!(result.data.value, 1);
        assert_eq!(result.fallback_depth, 0);
    }

    #[tokio::test]
    async fn undecodable_first_response_falls_through_to_second_model() {
        let provider = Arc::new(ScriptedProvider {
            responses: vec![Ok("not json at all"), Ok(r#"{"value": 2}"#)],
            calls: AtomicUsize::new(0),
        });
        let router = crate::llm::router::ModelRouter::new();
        let config = ModelRouterConfig { model_id: "heavy-pro".to_string(), temperature: 0.5, max_output_tokens: 16 };
        let result: GeneratedStructured<Shape> =
            generate_structured(provider.as_ref(), &router, &config, "prompt").await.unwrap();
        assert_eq!(result.data.value, 2);
        assert!(result.fallback_depth >= 1);
    }
}

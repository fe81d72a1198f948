//! LLM service with multi-provider fallback.
//!
//! Supports Gemini, Anthropic (Claude), and OpenAI-compatible APIs with
//! automatic fallback when rate limits are hit or providers fail. Providers
//! are built from environment configuration at startup.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, LlmProvider};
use crate::db::{Turn, TurnRole};
use crate::error::{Error, Result};

/// Maximum retries per provider before fallback
const MAX_RETRIES: u32 = 2;

/// Delay between retries (doubles each time)
const RETRY_DELAY_MS: u64 = 500;

/// Token budget for assistant replies
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// An image forwarded inline with the newest user turn.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageAttachment {
    fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Service for chat completions with multi-provider fallback.
///
/// Tries providers in priority order, automatically falling back
/// on rate limits or failures.
#[derive(Clone)]
pub struct LlmService {
    inner: Arc<LlmServiceInner>,
}

struct LlmServiceInner {
    providers: Vec<LlmProvider>,
    client: Client,
    /// Last error message from an LLM call
    last_error: RwLock<Option<String>>,
    /// Consecutive error count
    error_count: AtomicU32,
}

/// Response from LLM API
#[derive(Debug, Deserialize)]
struct LlmResponse {
    choices: Option<Vec<Choice>>,
    candidates: Option<Vec<Candidate>>,     // Gemini format
    content: Option<Vec<AnthropicContent>>, // Anthropic format
    error: Option<LlmError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct LlmError {
    message: String,
}

impl LlmService {
    /// Create a new LLM service from configuration.
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            providers = ?config.providers.iter().map(|p| &p.name).collect::<Vec<_>>(),
            "LLM service initialized"
        );

        Self {
            inner: Arc::new(LlmServiceInner {
                providers: config.providers.clone(),
                client,
                last_error: RwLock::new(None),
                error_count: AtomicU32::new(0),
            }),
        }
    }

    /// Check if any provider is configured.
    pub fn is_available(&self) -> bool {
        !self.inner.providers.is_empty()
    }

    /// Get error info for status endpoints.
    pub async fn get_error_info(&self) -> Option<(String, u32)> {
        let error = self.inner.last_error.read().await;
        error
            .as_ref()
            .map(|msg| (msg.clone(), self.inner.error_count.load(Ordering::Relaxed)))
    }

    async fn record_error(&self, error: &str) {
        let mut last_error = self.inner.last_error.write().await;
        *last_error = Some(error.to_string());
        drop(last_error);

        self.inner.error_count.fetch_add(1, Ordering::Relaxed);
    }

    async fn clear_error(&self) {
        let mut last_error = self.inner.last_error.write().await;
        *last_error = None;
        drop(last_error);

        self.inner.error_count.store(0, Ordering::Relaxed);
    }

    /// Run a chat completion over a full conversation, with automatic
    /// provider fallback. An image, when present, rides along with the
    /// newest user turn.
    pub async fn chat(&self, turns: &[Turn], image: Option<&ImageAttachment>) -> Result<String> {
        if self.inner.providers.is_empty() {
            return Err(Error::Llm("No LLM providers configured".to_string()));
        }

        let mut last_error = None;

        for provider in &self.inner.providers {
            match self.try_provider(provider, turns, image).await {
                Ok(response) => {
                    self.clear_error().await;
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        provider = %provider.name,
                        error = %e,
                        "Provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        let error_msg = last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "All providers failed".to_string());
        self.record_error(&error_msg).await;

        Err(last_error.unwrap_or_else(|| Error::Llm("All providers failed".to_string())))
    }

    /// Try a specific provider with retries.
    async fn try_provider(
        &self,
        provider: &LlmProvider,
        turns: &[Turn],
        image: Option<&ImageAttachment>,
    ) -> Result<String> {
        let mut delay = Duration::from_millis(RETRY_DELAY_MS);

        for attempt in 0..MAX_RETRIES {
            match self.call_provider(provider, turns, image).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if Self::is_retryable(&e) && attempt < MAX_RETRIES - 1 {
                        debug!(
                            provider = %provider.name,
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Retrying after error"
                        );
                        sleep(delay).await;
                        delay *= 2;
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(Error::Llm(format!(
            "Provider {} failed after {} retries",
            provider.name, MAX_RETRIES
        )))
    }

    /// Check if an error is retryable
    fn is_retryable(error: &Error) -> bool {
        let msg = error.to_string();
        msg.contains("rate limit")
            || msg.contains("429")
            || msg.contains("503")
            || msg.contains("timeout")
    }

    /// Make the actual API call to a provider.
    async fn call_provider(
        &self,
        provider: &LlmProvider,
        turns: &[Turn],
        image: Option<&ImageAttachment>,
    ) -> Result<String> {
        debug!(
            provider = %provider.name,
            model = %provider.model,
            turns = turns.len(),
            "Calling LLM provider"
        );

        let (url, body) = match provider.name.as_str() {
            "gemini" => build_gemini_request(provider, turns, image),
            "anthropic" => build_anthropic_request(provider, turns, image),
            _ => build_openai_request(provider, turns, image),
        };

        let mut request = self
            .inner
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        request = match provider.name.as_str() {
            "gemini" => request, // key rides in the URL
            "anthropic" => request
                .header("x-api-key", &provider.api_key)
                .header("anthropic-version", "2023-06-01"),
            _ => request.header("Authorization", format!("Bearer {}", provider.api_key)),
        };

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Llm(format!("Failed to read response: {}", e)))?;

        if status.as_u16() == 429 {
            return Err(Error::Llm("rate limit exceeded (429)".to_string()));
        }

        if !status.is_success() {
            return Err(Error::Llm(format!(
                "Provider returned {}: {}",
                status, text
            )));
        }

        parse_response(&provider.name, &text)
    }
}

/// Build request for the Gemini API.
///
/// System turns become the `systemInstruction`; the image, when present,
/// is inlined as a base64 part on the last user message.
fn build_gemini_request(
    provider: &LlmProvider,
    turns: &[Turn],
    image: Option<&ImageAttachment>,
) -> (String, Value) {
    let url = format!(
        "{}/models/{}:generateContent?key={}",
        provider.base_url, provider.model, provider.api_key
    );

    let system_text = collect_system_text(turns);
    let last_user_idx = turns.iter().rposition(|t| t.role == TurnRole::User);

    let contents: Vec<Value> = turns
        .iter()
        .enumerate()
        .filter(|(_, t)| t.role != TurnRole::System)
        .map(|(i, t)| {
            let role = match t.role {
                TurnRole::User => "user",
                _ => "model",
            };
            let mut parts = vec![json!({"text": t.text})];
            if Some(i) == last_user_idx {
                if let Some(img) = image {
                    parts.push(json!({
                        "inline_data": {
                            "mime_type": img.mime_type,
                            "data": img.base64(),
                        }
                    }));
                }
            }
            json!({"role": role, "parts": parts})
        })
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
            "temperature": 0.3
        }
    });

    if let Some(system) = system_text {
        body["systemInstruction"] = json!({"parts": [{"text": system}]});
    }

    (url, body)
}

/// Build request for the Anthropic Claude API.
fn build_anthropic_request(
    provider: &LlmProvider,
    turns: &[Turn],
    image: Option<&ImageAttachment>,
) -> (String, Value) {
    let url = format!("{}/messages", provider.base_url);

    let system_text = collect_system_text(turns);
    let last_user_idx = turns.iter().rposition(|t| t.role == TurnRole::User);

    let messages: Vec<Value> = turns
        .iter()
        .enumerate()
        .filter(|(_, t)| t.role != TurnRole::System)
        .map(|(i, t)| {
            let role = match t.role {
                TurnRole::User => "user",
                _ => "assistant",
            };
            if Some(i) == last_user_idx && image.is_some() {
                let img = image.unwrap();
                json!({
                    "role": role,
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": img.mime_type,
                                "data": img.base64(),
                            }
                        },
                        {"type": "text", "text": t.text}
                    ]
                })
            } else {
                json!({"role": role, "content": t.text})
            }
        })
        .collect();

    let mut body = json!({
        "model": provider.model,
        "messages": messages,
        "max_tokens": MAX_OUTPUT_TOKENS,
        "temperature": 0.3
    });

    if let Some(system) = system_text {
        body["system"] = json!(system);
    }

    (url, body)
}

/// Build request for OpenAI-compatible APIs.
fn build_openai_request(
    provider: &LlmProvider,
    turns: &[Turn],
    image: Option<&ImageAttachment>,
) -> (String, Value) {
    let url = format!("{}/chat/completions", provider.base_url);

    let last_user_idx = turns.iter().rposition(|t| t.role == TurnRole::User);

    let messages: Vec<Value> = turns
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let role = match t.role {
                TurnRole::System => "system",
                TurnRole::User => "user",
                TurnRole::Model => "assistant",
            };
            if Some(i) == last_user_idx && image.is_some() {
                let img = image.unwrap();
                let data_url = format!("data:{};base64,{}", img.mime_type, img.base64());
                json!({
                    "role": role,
                    "content": [
                        {"type": "text", "text": t.text},
                        {"type": "image_url", "image_url": {"url": data_url}}
                    ]
                })
            } else {
                json!({"role": role, "content": t.text})
            }
        })
        .collect();

    let body = json!({
        "model": provider.model,
        "messages": messages,
        "max_tokens": MAX_OUTPUT_TOKENS,
        "temperature": 0.3
    });

    (url, body)
}

/// Concatenate all system turns into one instruction block.
fn collect_system_text(turns: &[Turn]) -> Option<String> {
    let texts: Vec<&str> = turns
        .iter()
        .filter(|t| t.role == TurnRole::System)
        .map(|t| t.text.as_str())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}

/// Parse response from different API formats
fn parse_response(provider: &str, text: &str) -> Result<String> {
    let response: LlmResponse = serde_json::from_str(text)
        .map_err(|e| Error::Llm(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::Llm(error.message));
    }

    // Try Anthropic format first
    if let Some(content) = response.content {
        if let Some(content_block) = content.first() {
            return Ok(content_block.text.clone());
        }
    }

    // Try Gemini format
    if let Some(candidates) = response.candidates {
        if let Some(candidate) = candidates.first() {
            if let Some(part) = candidate.content.parts.first() {
                return Ok(part.text.clone());
            }
        }
    }

    // Try OpenAI format
    if let Some(choices) = response.choices {
        if let Some(choice) = choices.first() {
            if let Some(message) = &choice.message {
                return Ok(message.content.clone());
            }
            if let Some(text) = &choice.text {
                return Ok(text.clone());
            }
        }
    }

    Err(Error::Llm(format!("No content in {} response", provider)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str) -> LlmProvider {
        LlmProvider {
            name: name.to_string(),
            base_url: "http://localhost:9".to_string(),
            model: "test-model".to_string(),
            api_key: "key".to_string(),
            priority: 1,
        }
    }

    fn sample_turns() -> Vec<Turn> {
        vec![
            Turn::system("You are the campus assistant."),
            Turn::user("hello"),
            Turn::model("hi"),
            Turn::user("when is my class?"),
        ]
    }

    #[test]
    fn test_gemini_request_shape() {
        let (url, body) = build_gemini_request(&provider("gemini"), &sample_turns(), None);

        assert!(url.contains(":generateContent?key=key"));
        // System turn is lifted out of contents
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("campus assistant"));
    }

    #[test]
    fn test_gemini_image_attaches_to_last_user_turn() {
        let image = ImageAttachment {
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };
        let (_, body) = build_gemini_request(&provider("gemini"), &sample_turns(), Some(&image));

        let contents = body["contents"].as_array().unwrap();
        let last = contents.last().unwrap();
        let parts = last["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    }

    #[test]
    fn test_anthropic_request_shape() {
        let (url, body) = build_anthropic_request(&provider("anthropic"), &sample_turns(), None);

        assert!(url.ends_with("/messages"));
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert!(body["system"].as_str().unwrap().contains("campus"));
    }

    #[test]
    fn test_openai_request_keeps_system_message() {
        let (_, body) = build_openai_request(&provider("openai"), &sample_turns(), None);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "assistant");
    }

    #[test]
    fn test_parse_gemini_response() {
        let text = r#"{"candidates": [{"content": {"parts": [{"text": "Your class is at 9am"}]}}]}"#;
        assert_eq!(
            parse_response("gemini", text).unwrap(),
            "Your class is at 9am"
        );
    }

    #[test]
    fn test_parse_openai_response() {
        let text = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        assert_eq!(parse_response("openai", text).unwrap(), "hello");
    }

    #[test]
    fn test_parse_error_response() {
        let text = r#"{"error": {"message": "quota exceeded"}}"#;
        let err = parse_response("gemini", text).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}

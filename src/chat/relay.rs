use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::chat::error::ChatError;
use crate::chat::rate_limiter::{RateDecision, RateLimiter};
use crate::config::settings::ChatSettings;
use crate::observability::metrics::{get_metrics, OUTCOME_SUCCESS};
use crate::utils::constants::DEFAULT_REFERER;

pub const FALLBACK_REPLY: &str = "I didn't quite catch that. Please try again.";

/// Conversation sent by the site widget. Messages are forwarded as they
/// arrive, whatever their shape; a missing or null list is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    messages: Option<Vec<Value>>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Value>) -> Self {
        Self {
            messages: Some(messages),
        }
    }

    pub fn messages(&self) -> &[Value] {
        self.messages.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    max_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Forwards a conversation tail plus the system prompt to a chat-completion
/// endpoint, behind a per-client rate limit.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    history_turns: usize,
    title: String,
    system_prompt: String,
    limiter: RateLimiter,
}

impl ChatRelay {
    pub fn new(settings: &ChatSettings, api_key: Option<String>, limiter: RateLimiter) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("failed to build chat HTTP client")?;
        Ok(Self::with_client(client, settings, api_key, limiter))
    }

    pub fn with_client(client: Client, settings: &ChatSettings, api_key: Option<String>, limiter: RateLimiter) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            history_turns: settings.history_turns,
            title: settings.title.clone(),
            system_prompt: settings.system_prompt.clone(),
            limiter,
        }
    }

    /// System prompt followed by the last `history_turns` messages.
    pub fn build_messages(&self, history: &[Value]) -> Vec<Value> {
        let tail = &history[history.len().saturating_sub(self.history_turns)..];
        std::iter::once(json!({ "role": "system", "content": self.system_prompt }))
            .chain(tail.iter().cloned())
            .collect()
    }

    /// `request` is `None` when the body could not be read; that is reported
    /// only once the caller has passed the rate and key checks.
    pub async fn reply(&self, client_id: &str, referer: Option<&str>, request: Option<&ChatRequest>) -> Result<String, ChatError> {
        let metrics = get_metrics().await;
        let result = self.relay(client_id, referer, request).await;

        let outcome = match &result {
            Ok(_) => OUTCOME_SUCCESS,
            Err(e) => e.kind(),
        };
        metrics.chat_requests.with_label_values(&[outcome]).inc();
        if let Err(ChatError::RateLimited { .. }) = &result {
            metrics.chat_rate_limited.inc();
        }
        result
    }

    async fn relay(&self, client_id: &str, referer: Option<&str>, request: Option<&ChatRequest>) -> Result<String, ChatError> {
        if let RateDecision::Limited { retry_after } = self.limiter.check(client_id).await {
            debug!(client = client_id, "chat request rate limited");
            return Err(ChatError::RateLimited { retry_after });
        }

        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;
        let request = request.ok_or(ChatError::InvalidRequest)?;

        let payload = CompletionRequest {
            model: &self.model,
            messages: self.build_messages(request.messages()),
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", referer.unwrap_or(DEFAULT_REFERER))
            .header("X-Title", self.title.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "chat completion rejected");
            return Err(ChatError::Upstream { status, body });
        }

        let completion: CompletionResponse = response.json().await?;
        Ok(first_choice_text(completion))
    }
}

fn first_choice_text(completion: CompletionResponse) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_else(|| FALLBACK_REPLY.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(history_turns: usize) -> ChatRelay {
        let settings = ChatSettings {
            history_turns,
            system_prompt: "be brief".into(),
            ..ChatSettings::default()
        };
        ChatRelay::with_client(
            Client::new(),
            &settings,
            None,
            RateLimiter::new(15, Duration::from_secs(60)),
        )
    }

    fn turns(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({ "role": if i % 2 == 0 { "user" } else { "assistant" }, "content": format!("m{i}") }))
            .collect()
    }

    #[test]
    fn keeps_only_the_last_turns() {
        let messages = relay(6).build_messages(&turns(10));
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0], json!({ "role": "system", "content": "be brief" }));
        let contents: Vec<_> = messages[1..].iter().map(|m| m["content"].as_str().unwrap()).collect();
        assert_eq!(contents, vec!["m4", "m5", "m6", "m7", "m8", "m9"]);
    }

    #[test]
    fn short_history_is_forwarded_whole() {
        let messages = relay(6).build_messages(&turns(2));
        assert_eq!(messages.len(), 3);
        assert_eq!(relay(6).build_messages(&[]).len(), 1);
    }

    #[test]
    fn messages_of_any_shape_are_forwarded_untouched() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":null},{"role":"user","content":[{"type":"text","text":"hi"}]},"bare"]}"#,
        )
        .unwrap();
        let messages = relay(6).build_messages(request.messages());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1], json!({ "role": "user", "content": null }));
        assert_eq!(messages[2]["content"][0]["text"], "hi");
        assert_eq!(messages[3], json!("bare"));
    }

    #[test]
    fn missing_or_null_messages_are_empty() {
        for body in ["{}", r#"{"messages":null}"#] {
            let request: ChatRequest = serde_json::from_str(body).unwrap();
            assert!(request.messages().is_empty(), "body {body}");
        }
        assert!(serde_json::from_str::<ChatRequest>(r#"{"messages":"hi"}"#).is_err());
    }

    #[test]
    fn empty_choices_fall_back() {
        let parsed: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_choice_text(parsed), FALLBACK_REPLY);

        let parsed: CompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(first_choice_text(parsed), FALLBACK_REPLY);

        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#).unwrap();
        assert_eq!(first_choice_text(parsed), "hi");
    }

    #[tokio::test]
    async fn missing_key_is_reported_after_rate_check() {
        let request = ChatRequest::new(turns(1));
        let err = relay(6).reply("1.2.3.4", None, Some(&request)).await.unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured));
    }

    #[tokio::test]
    async fn unreadable_body_still_counts_against_the_limit() {
        let relay = ChatRelay::with_client(
            Client::new(),
            &ChatSettings::default(),
            Some("sk-test".into()),
            RateLimiter::new(1, Duration::from_secs(60)),
        );
        let err = relay.reply("1.2.3.4", None, None).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidRequest));
        let err = relay.reply("1.2.3.4", None, None).await.unwrap_err();
        assert!(matches!(err, ChatError::RateLimited { .. }));
    }
}

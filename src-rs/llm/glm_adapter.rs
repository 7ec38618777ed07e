use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::intent::{classification_prompt, parse_classification, Intent};
use super::rotation::KeyRing;
use super::types::{ChatClient, Message, ProviderError};

const CLASSIFY_MAX_TOKENS: u32 = 500;
const CLASSIFY_TEMPERATURE: f64 = 0.1;

pub struct GlmConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Client for OpenAI-compatible `chat/completions` endpoints (Zhipu GLM by
/// default).
pub struct GlmAdapter {
    cfg: GlmConfig,
    keys: KeyRing,
    client: Client,
}

impl GlmAdapter {
    pub fn new(mut cfg: GlmConfig) -> Result<Self, String> {
        if cfg.base_url.is_empty() {
            cfg.base_url = "https://open.bigmodel.cn/api/paas/v4".to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = "glm-4-plus".to_string();
        }
        if cfg.max_tokens == 0 {
            cfg.max_tokens = 4096;
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            keys: KeyRing::new(cfg.api_keys.clone()),
            cfg,
            client,
        })
    }

    fn complete(
        &self,
        messages: &[Message],
        max_tokens: u32,
        temperature: Option<f64>,
    ) -> Result<String, ProviderError> {
        let payload = build_payload(&self.cfg.model, messages, max_tokens, temperature);

        let tries = self.keys.len();
        if tries == 0 {
            return Err(ProviderError::new("auth_error", "no API keys configured", false));
        }
        let mut last_err = None;
        for _ in 0..tries {
            let key = match self.keys.next() {
                Some(key) => key,
                None => break,
            };
            match send_request(&self.client, &self.cfg.base_url, key, &payload) {
                Ok(content) => return Ok(content),
                Err(err) if err.retryable => {
                    warn!(code = %err.code, "chat completion failed, trying next key");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ProviderError::new("api_error", "request failed", true)))
    }
}

impl ChatClient for GlmAdapter {
    fn chat(&self, message: &str) -> Result<String, ProviderError> {
        let reply = self.complete(&[Message::user(message)], self.cfg.max_tokens, None)?;
        info!(model = %self.cfg.model, "chat completion succeeded");
        Ok(reply)
    }

    fn classify(&self, message: &str) -> Result<Intent, ProviderError> {
        let prompt = classification_prompt(message);
        let reply = self.complete(
            &[Message::user(&prompt)],
            CLASSIFY_MAX_TOKENS,
            Some(CLASSIFY_TEMPERATURE),
        )?;
        let intent = parse_classification(&reply);
        info!(kind = ?intent.kind, confidence = intent.confidence, "intent classified");
        Ok(intent)
    }
}

fn build_payload(model: &str, messages: &[Message], max_tokens: u32, temperature: Option<f64>) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages,
        "max_tokens": max_tokens,
    });
    if let Some(temperature) = temperature {
        payload["temperature"] = json!(temperature);
    }
    payload
}

fn send_request(client: &Client, base_url: &str, api_key: &str, payload: &Value) -> Result<String, ProviderError> {
    let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let resp = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .map_err(|err| ProviderError::new("network_error", &err.to_string(), true))?;

    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status.is_client_error() || status.is_server_error() {
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::new("auth_error", &body, true));
        }
        if status.as_u16() == 429 || body.to_lowercase().contains("quota") {
            return Err(ProviderError::new("rate_limit", &body, true));
        }
        if status.is_server_error() {
            return Err(ProviderError::new("server_error", &body, true));
        }
        return Err(ProviderError::new("api_error", &body, false));
    }

    let raw: Value = serde_json::from_str(&body)
        .map_err(|_| ProviderError::new("parse_error", "invalid json", false))?;
    parse_response(&raw)
}

fn parse_response(raw: &Value) -> Result<String, ProviderError> {
    raw.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.to_string())
        .ok_or_else(|| ProviderError::new("parse_error", "response has no message content", false))
}

use serde::{Deserialize, Serialize};
use std::fmt;

use super::intent::Intent;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(code: &str, message: &str, retryable: bool) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            retryable,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Single-turn chat completion. No conversation state is kept between calls.
pub trait ChatClient: Send + Sync {
    fn chat(&self, message: &str) -> Result<String, ProviderError>;

    /// Asks the model which kind of request `message` is.
    fn classify(&self, message: &str) -> Result<Intent, ProviderError>;
}

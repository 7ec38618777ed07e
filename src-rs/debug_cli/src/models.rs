use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub username: String,
    /// Post form-encoded bodies like the chat platform does instead of JSON.
    pub form: bool,
}

#[derive(Clone, Debug)]
pub struct Exchange {
    pub sent: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookRequest {
    pub text: String,
    pub username: String,
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
pub struct WebhookReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub features: Vec<Value>,
}

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;

use crate::models::{Health, WebhookReply, WebhookRequest};

/// Shell commands and telemetry can take a while on the relay side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn send(&self, text: &str, username: &str, form: bool) -> Result<String, String> {
        let url = format!("{}/webhook", self.base_url);
        let req = WebhookRequest {
            text: text.to_string(),
            username: username.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        };
        let builder = self.client.post(url);
        let builder = if form {
            builder.form(&req)
        } else {
            builder.json(&req)
        };
        let resp = builder.send().map_err(|err| err.to_string())?;

        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        let reply: WebhookReply = serde_json::from_str(&body)
            .map_err(|_| format!("http {}: {}", status.as_u16(), body))?;
        match (status.is_success(), reply.text, reply.error) {
            (true, Some(text), _) => Ok(text),
            (_, _, Some(error)) => Err(format!("http {}: {}", status.as_u16(), error)),
            _ => Err(format!("http {}: {}", status.as_u16(), body)),
        }
    }

    pub fn health(&self) -> Result<Health, String> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(url).send().map_err(|err| err.to_string())?;
        if resp.status().is_success() {
            resp.json::<Health>().map_err(|err| err.to_string())
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            Err(format!("http {}: {}", status.as_u16(), body))
        }
    }
}

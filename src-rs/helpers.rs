use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{ConfigError, RelayConfig};
use crate::llm::{ChatClient, GlmAdapter, GlmConfig};

fn load_keys_from_env(primary: &str, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(raw) = env::var(primary) {
        for item in raw.split(',') {
            let trimmed = item.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    for idx in 2..=10 {
        let key = format!("{}_{}", prefix, idx);
        if let Ok(value) = env::var(&key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    keys
}

pub fn load_llm_keys() -> Vec<String> {
    load_keys_from_env("GLM_API_KEY", "GLM_API_KEY")
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn env_parse<T: FromStr>(key: &str, fallback: T) -> Result<T, ConfigError> {
    match env_opt(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(fallback),
    }
}

fn env_bool(key: &str, fallback: bool) -> Result<bool, ConfigError> {
    match env_opt(key) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        },
        None => Ok(fallback),
    }
}

/// Expands a leading `~` against `home`.
pub fn expand_home(raw: &str, home: &std::path::Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

impl RelayConfig {
    /// Reads the process environment once. Everything downstream receives the
    /// resulting value instead of touching the environment again.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = RelayConfig::default();
        let home_dir = env_opt("RELAY_HOME")
            .map(PathBuf::from)
            .unwrap_or(defaults.home_dir);
        let tasks_dir = match env_opt("TASKS_DIR") {
            Some(raw) => expand_home(&raw, &home_dir),
            None => home_dir.join("SynologyChatbotClaude").join("tasks"),
        };
        Ok(Self {
            port: env_parse("PORT", defaults.port)?,
            llm_api_keys: load_llm_keys(),
            llm_base_url: env_opt("GLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: env_opt("GLM_MODEL").unwrap_or(defaults.llm_model),
            llm_max_tokens: env_parse("MAX_TOKENS", defaults.llm_max_tokens)?,
            llm_timeout_secs: env_parse("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            tasks_dir,
            home_dir,
            shell_timeout_secs: env_parse("SHELL_TIMEOUT_SECS", defaults.shell_timeout_secs)?,
            strict_transitions: env_bool("RELAY_STRICT_TRANSITIONS", defaults.strict_transitions)?,
            heuristics: env_bool("RELAY_HEURISTICS", defaults.heuristics)?,
            llm_intent: env_bool("RELAY_LLM_INTENT", defaults.llm_intent)?,
        })
    }
}

/// Builds the chat client when at least one API key is configured.
pub fn build_chat_client(cfg: &RelayConfig) -> Result<Option<Arc<dyn ChatClient>>, String> {
    if cfg.llm_api_keys.is_empty() {
        return Ok(None);
    }
    let adapter = GlmAdapter::new(GlmConfig {
        api_keys: cfg.llm_api_keys.clone(),
        base_url: cfg.llm_base_url.clone(),
        model: cfg.llm_model.clone(),
        max_tokens: cfg.llm_max_tokens,
        timeout_secs: cfg.llm_timeout_secs,
    })?;
    Ok(Some(Arc::new(adapter)))
}

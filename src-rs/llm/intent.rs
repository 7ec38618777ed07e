use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentKind {
    Chat,
    System,
    File,
    Command,
    Complex,
}

/// Model verdict on what a free-text message asks for.
#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    pub confidence: f64,
    pub path: Option<String>,
    pub command: Option<String>,
}

impl Intent {
    pub fn chat(confidence: f64) -> Self {
        Self {
            kind: IntentKind::Chat,
            confidence,
            path: None,
            command: None,
        }
    }
}

pub const CLASSIFY_PROMPT: &str = "You classify chat messages sent to a server operations bot.

Message: {message}

Intent types:
1. chat - conversation, questions, small talk
2. system - system information (CPU, memory, processes)
3. file - file operations (read, write, list)
4. command - run a specific shell command (ls, pwd, ...)
5. complex - multi-step work

Reply with JSON only, nothing else:
{\"intent\": \"<type>\", \"confidence\": 0.95, \"extracted\": {\"path\": \"<path>\", \"command\": \"<command>\"}}";

pub fn classification_prompt(message: &str) -> String {
    CLASSIFY_PROMPT.replace("{message}", message)
}

#[derive(Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    extracted: Option<Map<String, Value>>,
}

/// Pulls the first `{...}` block out of a model reply. Anything unparseable
/// degrades to a low-confidence chat intent.
pub fn parse_classification(reply: &str) -> Intent {
    let block = match Regex::new(r"(?s)\{.*\}")
        .ok()
        .and_then(|re| re.find(reply).map(|m| m.as_str().to_string()))
    {
        Some(block) => block,
        None => return Intent::chat(0.5),
    };
    let raw: RawClassification = match serde_json::from_str(&block) {
        Ok(raw) => raw,
        Err(_) => return Intent::chat(0.5),
    };
    let kind = match raw.intent.trim().to_lowercase().as_str() {
        "system" => IntentKind::System,
        "file" => IntentKind::File,
        "command" => IntentKind::Command,
        "complex" => IntentKind::Complex,
        _ => IntentKind::Chat,
    };
    let extracted = raw.extracted.unwrap_or_default();
    let text_field = |key: &str| {
        extracted
            .get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Intent {
        kind,
        confidence: raw.confidence.unwrap_or(0.0),
        path: text_field("path"),
        command: text_field("command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_json() {
        let reply = "Sure:\n```json\n{\"intent\": \"command\", \"confidence\": 0.9, \"extracted\": {\"command\": \"df -h\"}}\n```";
        let intent = parse_classification(reply);
        assert_eq!(intent.kind, IntentKind::Command);
        assert_eq!(intent.command.as_deref(), Some("df -h"));
        assert_eq!(intent.path, None);
        assert!((intent.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn empty_extracted_fields_are_dropped() {
        let intent = parse_classification(r#"{"intent": "file", "extracted": {"path": "  "}}"#);
        assert_eq!(intent.kind, IntentKind::File);
        assert_eq!(intent.path, None);
    }

    #[test]
    fn garbage_is_chat() {
        assert_eq!(parse_classification("no idea").kind, IntentKind::Chat);
        assert_eq!(parse_classification("{broken").kind, IntentKind::Chat);
        assert_eq!(parse_classification(r#"{"intent": "dance"}"#).kind, IntentKind::Chat);
    }

    #[test]
    fn prompt_embeds_message() {
        assert!(classification_prompt("check disk").contains("Message: check disk"));
    }
}

use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub port: u16,
    pub llm_api_keys: Vec<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
    pub tasks_dir: PathBuf,
    pub home_dir: PathBuf,
    pub shell_timeout_secs: u64,
    /// Reject task updates that move a status backwards or out of a terminal state.
    pub strict_transitions: bool,
    pub heuristics: bool,
    pub llm_intent: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            port: 5001,
            llm_api_keys: Vec::new(),
            llm_base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
            llm_model: "glm-4-plus".to_string(),
            llm_max_tokens: 4096,
            llm_timeout_secs: 60,
            tasks_dir: home_dir.join("SynologyChatbotClaude").join("tasks"),
            home_dir,
            shell_timeout_secs: 30,
            strict_transitions: false,
            heuristics: true,
            llm_intent: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:5001";
const DEFAULT_USER: &str = "debug-cli";

pub fn parse_config() -> CLIConfig {
    let mut cfg = CLIConfig {
        base_url: env_or("OPS_RELAY_URL", DEFAULT_URL.to_string()),
        username: env_or("OPS_RELAY_USER", DEFAULT_USER.to_string()),
        form: false,
    };

    let args: Vec<String> = env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--base" => {
                if let Some(value) = args.get(idx + 1) {
                    cfg.base_url = value.clone();
                    idx += 1;
                }
            }
            "--user" => {
                if let Some(value) = args.get(idx + 1) {
                    cfg.username = value.clone();
                    idx += 1;
                }
            }
            "--form" => cfg.form = true,
            _ => {}
        }
        idx += 1;
    }
    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => fallback,
    }
}

use std::io::{self, Write};

use crate::models::{CLIConfig, Exchange, Health};

pub fn banner(cfg: &CLIConfig) {
    println!("Ops Relay Debug CLI");
    println!("Relay: {}  User: {}", cfg.base_url, cfg.username);
    println!("Lines are posted to /webhook as chat messages (try /task, $sys, help).");
    println!("Local commands: /quit /health /base <url> /form [on|off] /history");
}

pub fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn reply(text: &str) {
    println!("relay> {}", text);
}

pub fn health(health: &Health) {
    let features: Vec<String> = health
        .features
        .iter()
        .map(|f| f.as_str().map(str::to_string).unwrap_or_else(|| f.to_string()))
        .collect();
    println!("status: {}", health.status);
    println!("features: {}", features.join(", "));
}

pub fn history(items: &[Exchange]) {
    if items.is_empty() {
        println!("no history");
        return;
    }
    for item in items {
        println!("> {}", item.sent);
        println!("relay> {}", item.reply);
    }
}

pub fn info(msg: &str) {
    println!("{}", msg);
}

pub fn error(msg: &str) {
    eprintln!("error: {}", msg);
}

use std::io;

use crate::client::HTTPClient;
use crate::models::{CLIConfig, Exchange};
use crate::render;

/// Local commands. Everything else, including relay commands like `/task`,
/// goes to the relay.
const LOCAL: [&str; 6] = ["/quit", "/exit", "/health", "/base", "/form", "/history"];

pub struct REPL {
    pub config: CLIConfig,
    pub client: HTTPClient,
    pub history: Vec<Exchange>,
}

impl REPL {
    pub fn new(config: CLIConfig, client: HTTPClient) -> Self {
        Self {
            config,
            client,
            history: Vec::new(),
        }
    }

    pub fn run(&mut self) {
        render::banner(&self.config);
        loop {
            render::prompt();
            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if is_local(&line) {
                if self.handle_command(&line) {
                    break;
                }
                continue;
            }
            self.send(&line);
        }
    }

    fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();
        match cmd {
            "/quit" | "/exit" => return true,
            "/health" => match self.client.health() {
                Ok(health) => render::health(&health),
                Err(err) => render::error(&err),
            },
            "/base" => {
                if rest.is_empty() {
                    render::info(&format!("base: {}", self.config.base_url));
                } else {
                    match HTTPClient::new(rest) {
                        Ok(client) => {
                            self.config.base_url = client.base_url.clone();
                            self.client = client;
                            render::info("base url updated");
                        }
                        Err(err) => render::error(&err),
                    }
                }
            }
            "/form" => {
                if rest.is_empty() {
                    self.config.form = !self.config.form;
                } else if let Some(flag) = parse_on_off(rest) {
                    self.config.form = flag;
                } else {
                    render::error("invalid flag");
                    return false;
                }
                render::info(&format!("form encoding: {}", self.config.form));
            }
            "/history" => render::history(&self.history),
            _ => {}
        }
        false
    }

    fn send(&mut self, line: &str) {
        match self.client.send(line, &self.config.username, self.config.form) {
            Ok(reply) => {
                render::reply(&reply);
                self.history.push(Exchange {
                    sent: line.to_string(),
                    reply,
                });
            }
            Err(err) => render::error(&err),
        }
    }
}

fn is_local(line: &str) -> bool {
    let head = line.split_whitespace().next().unwrap_or("");
    LOCAL.contains(&head)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_commands_are_not_local() {
        assert!(is_local("/quit"));
        assert!(is_local("/base http://nas:5001"));
        assert!(!is_local("/task backup the config"));
        assert!(!is_local("/tasks"));
        assert!(!is_local("$sys"));
        assert!(!is_local("/healthcheck"));
    }
}

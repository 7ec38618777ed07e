use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Blocked,
    Timeout,
    ExecutionError,
    PersistenceError,
    UpstreamError,
    InvalidTransition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Blocked => "blocked",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ExecutionError => "execution error",
            ErrorKind::PersistenceError => "persistence error",
            ErrorKind::UpstreamError => "upstream error",
            ErrorKind::InvalidTransition => "invalid transition",
        };
        f.write_str(label)
    }
}

/// Outcome of any dispatched action before it is rendered into reply text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub ok: bool,
    pub payload: String,
    pub error_kind: Option<ErrorKind>,
}

impl CommandResult {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            ok: true,
            payload: payload.into(),
            error_kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, payload: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: payload.into(),
            error_kind: Some(kind),
        }
    }
}

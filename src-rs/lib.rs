pub mod config;
pub mod helpers;
pub mod result;

#[path = "llm/lib.rs"]
pub mod llm;
#[path = "tools/lib.rs"]
pub mod tools;
#[path = "task/lib.rs"]
pub mod task;
#[path = "shell/lib.rs"]
pub mod shell;
#[path = "telemetry/lib.rs"]
pub mod telemetry;
#[path = "dispatch/lib.rs"]
pub mod dispatch;
#[path = "api/lib.rs"]
pub mod api;

pub use config::RelayConfig;
pub use dispatch::Dispatcher;
pub use result::{CommandResult, ErrorKind};

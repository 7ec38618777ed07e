pub mod gateway;
pub mod guard;
pub mod runner;

pub use gateway::{ShellGateway, DEFAULT_TIMEOUT};
pub use guard::{blocked_pattern, DENY_LIST};
pub use runner::{ProcessRunner, SystemRunner};

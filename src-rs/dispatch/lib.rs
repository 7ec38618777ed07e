pub mod command;
pub mod dispatcher;
pub mod heuristics;
pub mod render;

pub use command::{parse, Command, ShellCommand};
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use heuristics::{match_rules, Action, Folder, ListTarget};

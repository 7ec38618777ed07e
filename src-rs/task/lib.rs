pub mod store;
pub mod types;

pub use store::{TaskStore, LIST_CAP};
pub use types::{Task, TaskError, TaskKind, TaskPatch, TaskStatus};

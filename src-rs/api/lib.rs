pub use crate::dispatch::Dispatcher;

pub mod handlers;
pub mod server;

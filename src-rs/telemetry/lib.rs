pub mod probe;
pub mod types;

pub use probe::{SysinfoProbe, SystemProbe};
pub use types::{ProcessInfo, SystemSnapshot, UsageFigure};

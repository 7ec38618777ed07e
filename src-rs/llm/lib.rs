pub mod glm_adapter;
pub mod intent;
pub mod rotation;
pub mod types;

pub use glm_adapter::{GlmAdapter, GlmConfig};
pub use intent::{parse_classification, Intent, IntentKind};
pub use rotation::KeyRing;
pub use types::{ChatClient, Message, ProviderError};

//! Conversation handling: bounded history, provider dispatch and the
//! session that ties them to preferences and features

pub mod dispatcher;
pub mod history;
pub mod session;

pub use dispatcher::Dispatcher;
pub use history::{ConversationHistory, DEFAULT_MAX_HISTORY};
pub use session::{ChatSession, SystemInfo};

pub mod conversation_log;

pub use conversation_log::{ConversationLog, LogEntry};

//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod header;
pub mod history;
pub mod manager;
pub mod streaming;

pub use commands::{get_help_text, SlashCommand};
pub use composer::ConversationComposer;
pub use header::ChatHeader;
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationManager};
pub use streaming::StreamingIndicator;

//! Terminal chat client for a streaming agent endpoint.
//!
//! Each user turn is a single `GET` whose response is a `data: <json>` event
//! stream; decoded fragments are appended to the last assistant message in a
//! shared [`store::ConversationStore`].

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod streaming;
pub mod tui;
pub mod ui;

pub use client::{consume_stream, ChatClient, StreamSummary};
pub use config::Config;
pub use error::{ChatError, ChatResult};
pub use events::ServerEvent;
pub use store::{
    ConversationState, ConversationStore, IdGenerator, Message, MessageId, Role, SequentialIds,
    UuidGenerator,
};

//! In-memory conversation state shared between the UI and the streaming task

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Opaque message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh message ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> MessageId;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> MessageId {
        MessageId(Uuid::new_v4().to_string())
    }
}

/// Monotonic counter, starting at 1
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> MessageId {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        MessageId(id.to_string())
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    /// Empty assistant message that streamed fragments get appended to
    pub fn assistant_placeholder(id: MessageId) -> Self {
        Self::new(id, Role::Assistant, String::new())
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Plain conversation data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub is_loading: bool,
}

/// Cloneable handle over the conversation state.
///
/// All clones observe the same state. Each operation takes the lock exactly
/// once, so readers never see half of a mutation.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        // A panic while holding the lock cannot leave a message half-written,
        // so a poisoned state is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a message to the end of the log
    pub fn append_message(&self, message: Message) {
        self.lock().messages.push(message);
    }

    /// Concatenate `fragment` onto the last message if it is from the assistant
    pub fn append_to_last_assistant_message(&self, fragment: &str) {
        let mut state = self.lock();
        match state.messages.last_mut() {
            Some(last) if last.is_assistant() => last.content.push_str(fragment),
            _ => {}
        }
    }

    pub fn set_loading(&self, loading: bool) {
        self.lock().is_loading = loading;
    }

    /// Drop every message. The loading flag is left alone.
    pub fn clear(&self) {
        self.lock().messages.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn snapshot(&self) -> ConversationState {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.lock().messages.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }
}

impl fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ConversationStore")
            .field("messages", &state.messages.len())
            .field("is_loading", &state.is_loading)
            .finish()
    }
}

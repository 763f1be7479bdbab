//! Bounded conversation history
//!
//! Keeps the most recent messages of the conversation in order. When a new
//! message pushes the length past the bound, the oldest messages are
//! dropped first.

use crate::providers::{Message, Role};
use std::collections::VecDeque;

/// Default number of messages kept
pub const DEFAULT_MAX_HISTORY: usize = 15;

/// Ordered, length-bounded list of messages
///
/// # Examples
///
/// ```
/// use bella::chat::ConversationHistory;
/// use bella::providers::Role;
///
/// let mut history = ConversationHistory::new(2);
/// history.append(Role::User, "one");
/// history.append(Role::Assistant, "two");
/// history.append(Role::User, "three");
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.iter().next().unwrap().content, "two");
/// ```
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    max_len: usize,
}

impl ConversationHistory {
    /// Creates an empty history bounded to `max_len` messages
    ///
    /// A bound of zero is treated as one so the latest message is always kept.
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            messages: VecDeque::with_capacity(max_len + 1),
            max_len,
        }
    }

    /// Appends a message, evicting the oldest entries beyond the bound
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.push(Message::new(role, content));
    }

    /// Appends an already-built message
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_len {
            self.messages.pop_front();
        }
    }

    /// All messages, oldest first
    pub fn all(&self) -> &VecDeque<Message> {
        &self.messages
    }

    /// Iterates messages oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    /// Copies the messages into a contiguous vector
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Removes every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages held
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when no messages are held
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of messages kept
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a Message;
    type IntoIter = std::collections::vec_deque::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

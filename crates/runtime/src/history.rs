//! Conversation history.

use crate::model::{Message, Role};

/// Append-only record of a conversation.
///
/// Messages can be added but never changed or removed. Requests to the model
/// may use a trailing [`window`](Self::window) instead of the whole record.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `limit` messages, or everything when `limit` is `None`.
    ///
    /// A window always reaches back to the latest user message, so the
    /// current question is sent even with a tiny limit. It never starts on a
    /// tool result either: it is widened back to the assistant message that
    /// declared the call.
    pub fn window(&self, limit: Option<usize>) -> &[Message] {
        let Some(limit) = limit else {
            return &self.messages;
        };

        let mut start = self.messages.len().saturating_sub(limit);
        if let Some(last_user) = self.messages.iter().rposition(|m| m.role == Role::User) {
            start = start.min(last_user);
        }
        while start > 0
            && self
                .messages
                .get(start)
                .is_some_and(|message| message.role == Role::Tool)
        {
            start -= 1;
        }
        &self.messages[start..]
    }
}

//! Append-only conversation buffers.

use crate::message::ChatMessage;

/// Ordered message history owned by a single agent.
///
/// Messages can only be appended. Nothing already stored is ever reordered,
/// edited or removed, and the buffer is not `Clone` so two agents can never
/// end up sharing one.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a history from seed messages, in order.
    pub fn seeded(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_seeded_preserves_order() {
        let history =
            ConversationHistory::seeded([ChatMessage::system("rules"), ChatMessage::user("Hi")]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].role, Role::System);
        assert_eq!(history.messages()[1].text(), "Hi");
    }

    #[test]
    fn test_append_keeps_prefix_intact() {
        let mut history = ConversationHistory::seeded([ChatMessage::system("rules")]);
        let before = history.messages().to_vec();

        history.append(ChatMessage::user("one"));
        history.append(ChatMessage::assistant("two"));

        assert_eq!(&history.messages()[..before.len()], before.as_slice());
        assert_eq!(history.last().map(ChatMessage::text), Some("two"));
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = ConversationHistory::new();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }
}

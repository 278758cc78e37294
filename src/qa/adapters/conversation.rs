//! Conversation shared between the UI and in-flight turns.

use crate::qa::{
    domain::{Conversation, ConversationResult, MessageId},
    ports::TurnSink,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle onto a [`Conversation`] plus its failure notifications.
#[derive(Debug, Clone, Default)]
pub struct SharedConversation {
    conversation: Arc<RwLock<Conversation>>,
    notices: Arc<RwLock<Vec<String>>>,
}

impl SharedConversation {
    /// Wraps `conversation`.
    #[must_use]
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation: Arc::new(RwLock::new(conversation)),
            notices: Arc::default(),
        }
    }

    /// Opens a turn; see [`Conversation::begin_turn`].
    ///
    /// # Errors
    ///
    /// Propagates the conversation's rejection of the question.
    pub fn begin_turn(&self, question: &str) -> ConversationResult<MessageId> {
        self.write().begin_turn(question)
    }

    /// Opens a turn whose answer slot starts as `placeholder`.
    ///
    /// # Errors
    ///
    /// Propagates the conversation's rejection of the question.
    pub fn begin_turn_with(
        &self,
        question: &str,
        placeholder: &str,
    ) -> ConversationResult<MessageId> {
        self.write().begin_turn_with(question, placeholder)
    }

    /// Closes the turn owning `slot`.
    pub fn close_turn(&self, slot: MessageId) -> bool {
        self.write().close_turn(slot)
    }

    /// Returns the current text of `slot`.
    #[must_use]
    pub fn text_of(&self, slot: MessageId) -> Option<String> {
        self.read()
            .message(slot)
            .map(|message| message.text().to_owned())
    }

    /// Returns a copy of the transcript.
    #[must_use]
    pub fn snapshot(&self) -> Conversation {
        self.read().clone()
    }

    /// Returns the notifications raised so far.
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.notices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Conversation> {
        self.conversation.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Conversation> {
        self.conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl TurnSink for SharedConversation {
    fn replace_text(&self, slot: MessageId, text: &str) {
        if let Err(err) = self.write().replace(slot, text) {
            tracing::debug!(%err, "dropped answer update");
        }
    }

    fn append_text(&self, slot: MessageId, text: &str) {
        if let Err(err) = self.write().append(slot, text) {
            tracing::debug!(%err, "dropped answer update");
        }
    }

    fn notify_failure(&self, notice: &str) {
        tracing::warn!(notice, "question failed");
        self.notices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.to_owned());
    }
}

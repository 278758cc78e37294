//! Chat transcript shown to the user.

use super::{DEFAULT_PLACEHOLDER, MessageId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for conversation mutations.
pub type ConversationResult<T> = Result<T, ConversationError>;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking.
    User,
    /// The compute service's answer.
    Assistant,
}

impl Role {
    /// Returns the lowercase role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message slot of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    role: Role,
    text: String,
}

impl ChatMessage {
    /// Creates a message with a fresh identifier.
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text: text.into(),
        }
    }

    /// Returns the slot identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the author.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Errors raised while mutating a [`Conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// The question was blank after trimming.
    #[error("question is empty")]
    EmptyQuestion,

    /// A previous turn is still being answered.
    #[error("turn {0} is still being answered")]
    TurnInProgress(MessageId),

    /// No message with this identifier exists.
    #[error("message {0} does not exist")]
    UnknownMessage(MessageId),
}

/// Ordered transcript with at most one open turn.
///
/// # Examples
///
/// ```
/// use odin::qa::domain::Conversation;
///
/// let mut conversation = Conversation::new();
/// let slot = conversation.begin_turn("What is indexed?").expect("no open turn");
/// conversation.replace(slot, "Three folders.").expect("slot exists");
/// conversation.close_turn(slot);
///
/// assert_eq!(conversation.messages().len(), 2);
/// assert!(conversation.open_turn().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    open_turn: Option<MessageId>,
    placeholder: String,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Creates an empty transcript using the default placeholder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_placeholder(DEFAULT_PLACEHOLDER)
    }

    /// Creates an empty transcript with a custom placeholder.
    #[must_use]
    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            open_turn: None,
            placeholder: placeholder.into(),
        }
    }

    /// Appends the user's question and an assistant placeholder.
    ///
    /// Returns the placeholder's identifier; all answer updates for this turn
    /// target it.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::EmptyQuestion`] for a blank question and
    /// [`ConversationError::TurnInProgress`] while another turn is open.
    pub fn begin_turn(&mut self, question: &str) -> ConversationResult<MessageId> {
        let placeholder = self.placeholder.clone();
        self.begin_turn_with(question, &placeholder)
    }

    /// Like [`Self::begin_turn`], but the answer slot starts as `placeholder`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::begin_turn`].
    pub fn begin_turn_with(
        &mut self,
        question: &str,
        placeholder: &str,
    ) -> ConversationResult<MessageId> {
        if let Some(open) = self.open_turn {
            return Err(ConversationError::TurnInProgress(open));
        }
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(ConversationError::EmptyQuestion);
        }

        self.messages.push(ChatMessage::new(Role::User, trimmed));
        let answer = ChatMessage::new(Role::Assistant, placeholder);
        let slot = answer.id();
        self.messages.push(answer);
        self.open_turn = Some(slot);
        Ok(slot)
    }

    /// Closes the turn owning `slot`; returns whether it was open.
    pub fn close_turn(&mut self, slot: MessageId) -> bool {
        if self.open_turn == Some(slot) {
            self.open_turn = None;
            return true;
        }
        false
    }

    /// Replaces the text of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::UnknownMessage`] if the slot is missing.
    pub fn replace(&mut self, slot: MessageId, text: &str) -> ConversationResult<()> {
        let message = self.message_mut(slot)?;
        text.clone_into(&mut message.text);
        Ok(())
    }

    /// Appends to the text of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::UnknownMessage`] if the slot is missing.
    pub fn append(&mut self, slot: MessageId, text: &str) -> ConversationResult<()> {
        self.message_mut(slot)?.text.push_str(text);
        Ok(())
    }

    /// Returns the message with the given identifier.
    #[must_use]
    pub fn message(&self, slot: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == slot)
    }

    /// Returns all messages in display order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the slot of the turn still being answered.
    #[must_use]
    pub const fn open_turn(&self) -> Option<MessageId> {
        self.open_turn
    }

    /// Returns the placeholder inserted by [`Self::begin_turn`].
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn message_mut(&mut self, slot: MessageId) -> ConversationResult<&mut ChatMessage> {
        self.messages
            .iter_mut()
            .find(|message| message.id == slot)
            .ok_or(ConversationError::UnknownMessage(slot))
    }
}

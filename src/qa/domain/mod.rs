//! Pure types for streamed question answering.

mod conversation;
mod decode;
mod frame;
mod ids;
mod query;
mod session;
mod texts;

pub use conversation::{ChatMessage, Conversation, ConversationError, ConversationResult, Role};
pub use decode::Utf8Carry;
pub use frame::{EventFrame, FrameDecoder};
pub use ids::MessageId;
pub use query::{QaAnswer, QaQuery};
pub use session::{SlotUpdate, StreamSession};
pub use texts::{
    DEFAULT_FAILURE_NOTICE, DEFAULT_FAILURE_TEXT, DEFAULT_NO_RESPONSE, DEFAULT_PLACEHOLDER,
    TurnTexts,
};

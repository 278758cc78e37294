//! Destination for a turn's answer text.

use crate::qa::domain::MessageId;

/// Receives the updates of one conversation turn.
///
/// Every call names the slot it targets so an implementation never has to
/// guess which message is being answered.
#[cfg_attr(test, mockall::automock)]
pub trait TurnSink: Send + Sync {
    /// Replaces the text of `slot`.
    fn replace_text(&self, slot: MessageId, text: &str);

    /// Appends to the text of `slot`.
    fn append_text(&self, slot: MessageId, text: &str);

    /// Raises a transient user-visible failure notification.
    fn notify_failure(&self, notice: &str);
}

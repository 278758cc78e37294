//! User-visible texts written into a turn's answer slot.

/// Placeholder shown while an answer is pending.
pub const DEFAULT_PLACEHOLDER: &str = "Thinking…";
/// Shown when the non-streaming answer has no text.
pub const DEFAULT_NO_RESPONSE: &str = "(no response)";
/// Left in the answer slot when both request paths failed.
pub const DEFAULT_FAILURE_TEXT: &str = "The answer could not be retrieved.";
/// Transient notification raised when both request paths failed.
pub const DEFAULT_FAILURE_NOTICE: &str = "Network error: QA failed";

/// Texts used while filling an answer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTexts {
    /// Placeholder inserted when the turn begins.
    pub placeholder: String,
    /// Replacement when the fallback answer is absent.
    pub no_response: String,
    /// Replacement when the fallback request fails.
    pub failure: String,
    /// Notification raised alongside `failure`.
    pub failure_notice: String,
}

impl Default for TurnTexts {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            no_response: DEFAULT_NO_RESPONSE.to_owned(),
            failure: DEFAULT_FAILURE_TEXT.to_owned(),
            failure_notice: DEFAULT_FAILURE_NOTICE.to_owned(),
        }
    }
}

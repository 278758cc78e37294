//! Per-query stream state.

use super::{EventFrame, FrameDecoder};
use tokio::time::Instant;

/// Change to apply to the turn's answer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotUpdate {
    /// First payload of the session: replaces the placeholder.
    Replace(String),
    /// Later payloads: appended to what is already shown.
    Append(String),
}

/// State of one in-flight streamed answer.
///
/// Created when the stream opens and dropped when reading ends. Frames are
/// applied strictly in arrival order.
#[derive(Debug)]
pub struct StreamSession {
    decoder: FrameDecoder,
    received_any: bool,
    terminated: bool,
    deadline: Instant,
}

impl StreamSession {
    /// Opens a session whose watchdog expires at `deadline`.
    #[must_use]
    pub const fn new(deadline: Instant) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            received_any: false,
            terminated: false,
            deadline,
        }
    }

    /// Decodes one read and returns the slot updates it produced.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<SlotUpdate> {
        self.decoder
            .push(chunk)
            .iter()
            .filter_map(|frame| self.apply(frame))
            .collect()
    }

    /// Applies a single frame to the session flags.
    pub fn apply(&mut self, frame: &EventFrame) -> Option<SlotUpdate> {
        if frame.is_terminal() {
            self.terminated = true;
        }
        if frame.is_error() {
            tracing::warn!(detail = frame.payload(), "compute service reported a stream error");
        }
        let payload = frame.payload();
        if payload.is_empty() {
            return None;
        }
        let first = !self.received_any;
        self.received_any = true;
        let text = payload.to_owned();
        Some(if first {
            SlotUpdate::Replace(text)
        } else {
            SlotUpdate::Append(text)
        })
    }

    /// Drops any incomplete trailing frame once reading has ended.
    pub fn close(&mut self) {
        let dropped = self.decoder.discard();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded incomplete trailing frame");
        }
    }

    /// Returns whether a non-empty payload was applied.
    #[must_use]
    pub const fn received_any(&self) -> bool {
        self.received_any
    }

    /// Returns whether the terminal marker was seen.
    #[must_use]
    pub const fn terminated(&self) -> bool {
        self.terminated
    }

    /// Returns when the watchdog fires.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns whether the non-streaming request must be issued.
    #[must_use]
    pub const fn needs_fallback(&self) -> bool {
        !self.received_any && !self.terminated
    }
}

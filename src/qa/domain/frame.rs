//! Event-stream framing.
//!
//! The buffer is split on blank lines; every complete frame is classified
//! line by line and the trailing partial frame stays buffered.

use super::Utf8Carry;

const FRAME_DELIMITER: &str = "\n\n";
const DATA_MARKER: &str = "data: ";
const EVENT_MARKER: &str = "event: ";
const TERMINAL_MARKER: &str = "event: done";
const ERROR_EVENT: &str = "error";

/// One complete frame of an event stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFrame {
    event: Option<String>,
    terminal: bool,
    payload: String,
}

impl EventFrame {
    /// Classifies the lines of a single frame.
    ///
    /// Data lines lose their marker and are joined with newlines; any line
    /// starting with `event: done` marks the frame terminal.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut frame = Self::default();
        let mut data = Vec::new();
        for line in raw.split('\n').filter(|line| !line.is_empty()) {
            if line.starts_with(TERMINAL_MARKER) {
                frame.terminal = true;
            }
            if let Some(name) = line.strip_prefix(EVENT_MARKER) {
                frame.event = Some(name.trim().to_owned());
            } else if let Some(text) = line.strip_prefix(DATA_MARKER) {
                data.push(text);
            }
        }
        frame.payload = data.join("\n");
        frame
    }

    /// Returns the declared event name, if any.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// Returns whether the frame carries the terminal marker.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Returns whether the frame reports a service-side error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.event() == Some(ERROR_EVENT)
    }

    /// Returns the joined data payload; empty when the frame had none.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Turns raw stream bytes into complete [`EventFrame`]s.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    text: Utf8Carry,
    buffer: String,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: Utf8Carry::new(),
            buffer: String::new(),
        }
    }

    /// Feeds one read and returns every frame it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<EventFrame> {
        let decoded = self.text.decode(chunk);
        self.buffer.push_str(&decoded);
        if !self.buffer.contains(FRAME_DELIMITER) {
            return Vec::new();
        }

        let mut parts: Vec<&str> = self.buffer.split(FRAME_DELIMITER).collect();
        let partial = parts.pop().unwrap_or_default().to_owned();
        let frames = parts.into_iter().map(EventFrame::parse).collect();
        self.buffer = partial;
        frames
    }

    /// Returns the text of the incomplete trailing frame.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Discards the incomplete trailing frame and any carried bytes.
    ///
    /// Returns how many characters were dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.chars().count() + self.text.finish().chars().count();
        self.buffer.clear();
        dropped
    }
}

//! Incremental UTF-8 decoding across read boundaries.

use std::char::REPLACEMENT_CHARACTER;

/// UTF-8 decoder that carries incomplete sequences over to the next read.
///
/// Invalid sequences decode to U+FFFD; an incomplete sequence at the end of a
/// chunk is held back until more bytes arrive.
#[derive(Debug, Clone, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Creates a decoder with nothing carried over.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decodes `chunk`, prefixed by any bytes carried from the previous call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            text.push(REPLACEMENT_CHARACTER);
                            rest = after.get(len..).unwrap_or_default();
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let carried = rest.to_vec();
        self.pending = carried;
        text
    }

    /// Returns how many bytes are waiting for the rest of their sequence.
    #[must_use]
    pub fn carried(&self) -> usize {
        self.pending.len()
    }

    /// Flushes the carry, decoding an unfinished sequence as U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT_CHARACTER.to_string()
    }
}

//! Seams between the streaming consumer and its collaborators.

mod sink;
mod transport;

#[cfg(test)]
pub(crate) use sink::MockTurnSink;
pub use sink::TurnSink;
pub use transport::{ByteStream, QaTransport, QaTransportError, QaTransportResult, StreamOpening};

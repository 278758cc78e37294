//! Question-answering orchestration.

mod consumer;

pub use consumer::{StreamEnd, StreamingConsumer, TurnOutcome};

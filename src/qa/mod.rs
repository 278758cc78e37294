//! Question answering against the compute service.
//!
//! A user question becomes a conversation turn: the user message plus an
//! assistant placeholder. The [`services::StreamingConsumer`] fills that
//! placeholder from the streamed answer and falls back to a single
//! non-streaming request when the stream yields nothing useful.
//!
//! - **Domain**: incremental decoding ([`domain::FrameDecoder`],
//!   [`domain::StreamSession`]) and UI state ([`domain::Conversation`])
//! - **Ports**: the [`ports::QaTransport`] and [`ports::TurnSink`] seams
//! - **Adapters**: `reqwest` transport, shared conversation, scripted
//!   transport for tests
//! - **Services**: the streaming consumer with its watchdog and fallback

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

//! Transport and sink implementations for question answering.

mod conversation;
mod http;
pub mod memory;

pub use conversation::SharedConversation;
pub use http::HttpQaTransport;

//! Streams one answer into its conversation slot.

use crate::config::DEFAULT_STREAM_WATCHDOG;
use crate::qa::{
    adapters::SharedConversation,
    domain::{ConversationResult, MessageId, QaQuery, SlotUpdate, StreamSession, TurnTexts},
    ports::{ByteStream, QaTransport, StreamOpening, TurnSink},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why the read loop of a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The service closed the stream.
    Closed,
    /// A terminal frame was read.
    Terminated,
    /// The watchdog deadline passed first.
    WatchdogExpired,
    /// The connection broke mid-stream.
    Interrupted,
}

/// How a turn's answer slot was finally filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// At least one streamed payload was shown.
    Streamed,
    /// The stream ended with its terminal marker.
    Terminated,
    /// The non-streaming answer (or its absence marker) was shown.
    Fallback,
    /// Both request paths failed; the failure text was shown.
    Failed,
}

/// Runs user questions against the compute service.
///
/// Streaming is attempted first. Payloads are written to the turn's slot as
/// frames arrive; when the stream produced no payload and no terminal marker,
/// exactly one non-streaming request fills the slot instead.
pub struct StreamingConsumer<T: QaTransport> {
    transport: Arc<T>,
    watchdog: Duration,
    texts: TurnTexts,
}

impl<T: QaTransport> StreamingConsumer<T> {
    /// Creates a consumer with the default watchdog and texts.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            watchdog: DEFAULT_STREAM_WATCHDOG,
            texts: TurnTexts::default(),
        }
    }

    /// Overrides the stream watchdog.
    #[must_use]
    pub const fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Overrides the user-visible texts.
    #[must_use]
    pub fn with_texts(mut self, texts: TurnTexts) -> Self {
        self.texts = texts;
        self
    }

    /// Returns the configured watchdog.
    #[must_use]
    pub const fn watchdog(&self) -> Duration {
        self.watchdog
    }

    /// Opens a turn on `conversation`, answers it and closes it again.
    ///
    /// # Errors
    ///
    /// Returns the conversation's rejection when the question is blank or a
    /// turn is already open; no request is made in that case.
    pub async fn ask(
        &self,
        conversation: &SharedConversation,
        query: &QaQuery,
    ) -> ConversationResult<TurnOutcome> {
        let slot = conversation.begin_turn_with(query.question(), &self.texts.placeholder)?;
        let outcome = self.answer(query, slot, conversation).await;
        conversation.close_turn(slot);
        Ok(outcome)
    }

    /// Fills `slot` through `sink` with the answer to `query`.
    pub async fn answer(&self, query: &QaQuery, slot: MessageId, sink: &dyn TurnSink) -> TurnOutcome {
        match self.transport.open_stream(query).await {
            Ok(StreamOpening::EventStream(body)) => {
                let session = self.consume(body, slot, sink).await;
                if !session.needs_fallback() {
                    return if session.terminated() {
                        TurnOutcome::Terminated
                    } else {
                        TurnOutcome::Streamed
                    };
                }
            }
            Ok(StreamOpening::NotEventStream { content_type }) => {
                tracing::debug!(?content_type, "answer is not streamed");
            }
            Err(err) => {
                tracing::warn!(%err, "streaming request failed");
            }
        }
        self.fall_back(query, slot, sink).await
    }

    async fn consume(&self, mut body: ByteStream, slot: MessageId, sink: &dyn TurnSink) -> StreamSession {
        let mut session = StreamSession::new(Instant::now() + self.watchdog);
        let end = loop {
            let read = match tokio::time::timeout_at(session.deadline(), body.next()).await {
                Err(_) => break StreamEnd::WatchdogExpired,
                Ok(None) => break StreamEnd::Closed,
                Ok(Some(Err(err))) => {
                    tracing::warn!(%err, "answer stream interrupted");
                    break StreamEnd::Interrupted;
                }
                Ok(Some(Ok(bytes))) => bytes,
            };
            for update in session.ingest(&read) {
                match update {
                    SlotUpdate::Replace(text) => sink.replace_text(slot, &text),
                    SlotUpdate::Append(text) => sink.append_text(slot, &text),
                }
            }
            if session.terminated() {
                break StreamEnd::Terminated;
            }
        };
        session.close();
        tracing::debug!(
            ?end,
            received_any = session.received_any(),
            terminated = session.terminated(),
            "answer stream finished"
        );
        if end == StreamEnd::WatchdogExpired {
            tracing::warn!(watchdog = ?self.watchdog, "answer stream stalled");
        }
        session
    }

    async fn fall_back(&self, query: &QaQuery, slot: MessageId, sink: &dyn TurnSink) -> TurnOutcome {
        match self.transport.ask(query).await {
            Ok(answer) => {
                let text = answer.text().unwrap_or(self.texts.no_response.as_str());
                sink.replace_text(slot, text);
                TurnOutcome::Fallback
            }
            Err(err) => {
                tracing::error!(%err, "non-streaming request failed");
                sink.replace_text(slot, &self.texts.failure);
                sink.notify_failure(&self.texts.failure_notice);
                TurnOutcome::Failed
            }
        }
    }
}

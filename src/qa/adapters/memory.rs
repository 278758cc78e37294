//! Scripted in-memory question transport.

use crate::qa::{
    domain::{QaAnswer, QaQuery},
    ports::{ByteStream, QaTransport, QaTransportError, QaTransportResult, StreamOpening},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// What a scripted event stream does after its last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTail {
    /// The service closes the stream.
    Close,
    /// The stream stays open without further data.
    Stall,
    /// The connection breaks with a transport error.
    Break,
}

/// How the scripted streaming endpoint answers.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// An event stream delivering `reads` in order, then ending per `tail`.
    Events {
        /// Raw reads, delivered one per poll.
        reads: Vec<Bytes>,
        /// Pause before each read, if any.
        interval: Option<Duration>,
        /// What follows the last read.
        tail: StreamTail,
    },
    /// A successful response that is not an event stream.
    NotEventStream {
        /// Declared content type.
        content_type: String,
    },
    /// The request fails before any response arrives.
    Unreachable,
}

/// How the scripted non-streaming endpoint answers.
#[derive(Debug, Clone)]
pub enum AnswerScript {
    /// A decoded body.
    Answer(QaAnswer),
    /// The request fails.
    Unreachable,
}

#[derive(Debug)]
struct TransportState {
    stream: StreamScript,
    answer: AnswerScript,
    stream_requests: Vec<QaQuery>,
    fallback_requests: Vec<QaQuery>,
}

/// Question transport replaying a fixed script and recording every request.
///
/// Defaults to an unreachable streaming endpoint and an answer without text.
#[derive(Debug, Clone)]
pub struct ScriptedQaTransport {
    state: Arc<RwLock<TransportState>>,
}

impl Default for ScriptedQaTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedQaTransport {
    /// Creates a transport with the default script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TransportState {
                stream: StreamScript::Unreachable,
                answer: AnswerScript::Answer(QaAnswer::missing()),
                stream_requests: Vec::new(),
                fallback_requests: Vec::new(),
            })),
        }
    }

    /// Scripts an event stream of `reads` that then closes.
    pub fn stream_reads<I, B>(&self, reads: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.script_events(reads, None, StreamTail::Close);
    }

    /// Scripts an event stream of `reads` that then goes silent.
    pub fn stream_reads_then_stall<I, B>(&self, reads: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.script_events(reads, None, StreamTail::Stall);
    }

    /// Scripts an event stream of `reads` whose connection then breaks.
    pub fn stream_reads_then_break<I, B>(&self, reads: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.script_events(reads, None, StreamTail::Break);
    }

    /// Scripts an event stream delivering one of `reads` per `interval`.
    pub fn stream_reads_every<I, B>(&self, reads: I, interval: Duration)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.script_events(reads, Some(interval), StreamTail::Close);
    }

    fn script_events<I, B>(&self, reads: I, interval: Option<Duration>, tail: StreamTail)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.script_stream(StreamScript::Events {
            reads: reads.into_iter().map(Into::into).collect(),
            interval,
            tail,
        });
    }

    /// Scripts the streaming endpoint.
    pub fn script_stream(&self, script: StreamScript) {
        self.write().stream = script;
    }

    /// Scripts the non-streaming endpoint.
    pub fn script_answer(&self, script: AnswerScript) {
        self.write().answer = script;
    }

    /// Returns every streaming request issued.
    #[must_use]
    pub fn stream_requests(&self) -> Vec<QaQuery> {
        self.read().stream_requests.clone()
    }

    /// Returns every non-streaming request issued.
    #[must_use]
    pub fn fallback_requests(&self) -> Vec<QaQuery> {
        self.read().fallback_requests.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, TransportState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TransportState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn refused() -> QaTransportError {
    QaTransportError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

fn reset() -> QaTransportError {
    QaTransportError::transport(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset",
    ))
}

fn scripted_body(reads: Vec<Bytes>, interval: Option<Duration>, tail: StreamTail) -> ByteStream {
    let delivered = stream::iter(reads.into_iter().map(Ok::<Bytes, QaTransportError>));
    let delivered = match interval {
        Some(pause) => delivered
            .then(move |read| async move {
                tokio::time::sleep(pause).await;
                read
            })
            .boxed(),
        None => delivered.boxed(),
    };
    match tail {
        StreamTail::Close => delivered,
        StreamTail::Stall => delivered.chain(stream::pending()).boxed(),
        StreamTail::Break => delivered.chain(stream::once(async { Err(reset()) })).boxed(),
    }
}

#[async_trait]
impl QaTransport for ScriptedQaTransport {
    async fn open_stream(&self, query: &QaQuery) -> QaTransportResult<StreamOpening> {
        let script = {
            let mut state = self.write();
            state.stream_requests.push(query.clone());
            state.stream.clone()
        };
        match script {
            StreamScript::Events {
                reads,
                interval,
                tail,
            } => Ok(StreamOpening::EventStream(scripted_body(reads, interval, tail))),
            StreamScript::NotEventStream { content_type } => Ok(StreamOpening::NotEventStream {
                content_type: Some(content_type),
            }),
            StreamScript::Unreachable => Err(refused()),
        }
    }

    async fn ask(&self, query: &QaQuery) -> QaTransportResult<QaAnswer> {
        let script = {
            let mut state = self.write();
            state.fallback_requests.push(query.clone());
            state.answer.clone()
        };
        match script {
            AnswerScript::Answer(answer) => Ok(answer),
            AnswerScript::Unreachable => Err(refused()),
        }
    }
}

//! Progress events of a streamed model download.

use super::{ComputeClientError, ComputeClientResult};
use crate::qa::domain::{EventFrame, FrameDecoder};
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;

/// Progress of a model download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullEvent {
    /// One line of downloader output.
    Progress(String),
    /// The download finished successfully.
    Done(String),
    /// The download failed.
    Failed(String),
}

impl PullEvent {
    fn from_frame(frame: &EventFrame) -> Option<Self> {
        let text = frame.payload().to_owned();
        if frame.is_terminal() {
            return Some(Self::Done(text));
        }
        if frame.is_error() {
            return Some(Self::Failed(text));
        }
        (!text.is_empty()).then_some(Self::Progress(text))
    }

    /// Returns whether no further events follow.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/// Stream of download progress, ending after the first final event.
pub type PullStream = BoxStream<'static, ComputeClientResult<PullEvent>>;

struct PullState {
    body: BoxStream<'static, ComputeClientResult<Bytes>>,
    decoder: FrameDecoder,
    pending: VecDeque<ComputeClientResult<PullEvent>>,
    finished: bool,
}

pub(super) fn pull_events<S, E>(body: S) -> PullStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = PullState {
        body: body.map(|read| read.map_err(ComputeClientError::transport)).boxed(),
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    // The body is never polled again once a final event is queued.
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await? {
                Ok(bytes) => {
                    let frames = state.decoder.push(&bytes);
                    for event in frames.iter().filter_map(PullEvent::from_frame) {
                        let last = event.is_final();
                        state.pending.push_back(Ok(event));
                        if last {
                            state.finished = true;
                            break;
                        }
                    }
                }
                Err(err) => {
                    state.finished = true;
                    state.pending.push_back(Err(err));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads(chunks: Vec<&'static str>) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes()))),
        )
    }

    #[tokio::test]
    async fn progress_lines_end_with_done() {
        let events: Vec<PullEvent> = pull_events(reads(vec![
            "data: pulling manifest\n\ndata: 50%",
            "\n\nevent: done\ndata: ok\n\ndata: ignored\n\n",
        ]))
        .map(|event| event.expect("no transport error"))
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                PullEvent::Progress("pulling manifest".to_owned()),
                PullEvent::Progress("50%".to_owned()),
                PullEvent::Done("ok".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn error_event_is_final() {
        let events: Vec<PullEvent> =
            pull_events(reads(vec!["event: error\ndata: exit code 1\n\n", "data: more\n\n"]))
                .map(|event| event.expect("no transport error"))
                .collect()
                .await;

        assert_eq!(events, vec![PullEvent::Failed("exit code 1".to_owned())]);
    }

    #[tokio::test]
    async fn open_connection_ends_after_final_event() {
        let body = reads(vec!["data: verifying\n\nevent: done\ndata: ok\n\n"])
            .chain(stream::pending());

        let events: Vec<PullEvent> = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            pull_events(body)
                .map(|event| event.expect("no transport error"))
                .collect::<Vec<_>>(),
        )
        .await
        .expect("stream should end without waiting for the body");

        assert_eq!(
            events,
            vec![
                PullEvent::Progress("verifying".to_owned()),
                PullEvent::Done("ok".to_owned()),
            ]
        );
    }
}

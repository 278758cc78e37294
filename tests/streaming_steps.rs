//! Behaviour tests for streamed answers, the watchdog and the fallback path.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use eyre::{WrapErr, eyre};
use odin::qa::{
    adapters::{
        SharedConversation,
        memory::{AnswerScript, ScriptedQaTransport, StreamScript},
    },
    domain::{QaAnswer, QaQuery},
    services::{StreamingConsumer, TurnOutcome},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::{Builder, Runtime};

struct StreamingWorld {
    transport: Arc<ScriptedQaTransport>,
    conversation: SharedConversation,
    query: Option<QaQuery>,
    outcome: Option<TurnOutcome>,
    elapsed: Duration,
    runtime: Runtime,
}

impl StreamingWorld {
    fn new() -> Result<Self, eyre::Report> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .wrap_err("paused runtime should build")?;
        Ok(Self {
            transport: Arc::new(ScriptedQaTransport::new()),
            conversation: SharedConversation::default(),
            query: None,
            outcome: None,
            elapsed: Duration::ZERO,
            runtime,
        })
    }

    fn answer(&self) -> Result<String, eyre::Report> {
        self.conversation
            .snapshot()
            .messages()
            .last()
            .map(|message| message.text().to_owned())
            .ok_or_else(|| eyre!("transcript is empty"))
    }
}

#[fixture]
fn world() -> StreamingWorld {
    StreamingWorld::new().unwrap_or_else(|err| panic!("world setup failed: {err:?}"))
}

/// Turns the `\n` escapes written in feature files into newlines.
fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

#[given("a question \"{question}\" about \"{base_path}\"")]
fn a_question(world: &mut StreamingWorld, question: String, base_path: String) {
    world.query = Some(QaQuery::new(base_path, question));
}

#[given("the stream delivers the reads \"{first}\" and \"{second}\"")]
fn stream_delivers_reads(world: &mut StreamingWorld, first: String, second: String) {
    world
        .transport
        .stream_reads([unescape(&first), unescape(&second)]);
}

#[given("the stream delivers \"{answer}\" split inside its first character")]
fn stream_splits_character(world: &mut StreamingWorld, answer: String) -> Result<(), eyre::Report> {
    let frame = format!("data: {answer}\n\n").into_bytes();
    let (head, tail) = frame
        .split_at_checked(7)
        .ok_or_else(|| eyre!("frame for {answer:?} is too short to split"))?;
    world
        .transport
        .stream_reads([Bytes::copy_from_slice(head), Bytes::copy_from_slice(tail)]);
    Ok(())
}

#[given("the stream delivers the read \"{read}\"")]
fn stream_delivers_read(world: &mut StreamingWorld, read: String) {
    world.transport.stream_reads([unescape(&read)]);
}

#[given("the stream endpoint answers with content type \"{content_type}\"")]
fn stream_not_event_stream(world: &mut StreamingWorld, content_type: String) {
    world
        .transport
        .script_stream(StreamScript::NotEventStream { content_type });
}

#[given("the stream opens but stays silent")]
fn stream_stays_silent(world: &mut StreamingWorld) {
    world.transport.stream_reads_then_stall(Vec::<Bytes>::new());
}

#[given("the connection breaks before any frame")]
fn connection_breaks_immediately(world: &mut StreamingWorld) {
    world
        .transport
        .stream_reads_then_break(Vec::<Bytes>::new());
}

#[given("the connection breaks after the read \"{read}\"")]
fn connection_breaks_after(world: &mut StreamingWorld, read: String) {
    world.transport.stream_reads_then_break([unescape(&read)]);
}

#[given("the stream sends only keep-alive frames once per second")]
fn keep_alive_drip(world: &mut StreamingWorld) {
    world.transport.stream_reads_every(
        std::iter::repeat_n(": keep-alive\n\n", 60),
        Duration::from_secs(1),
    );
}

#[given("the stream endpoint is unreachable")]
fn stream_unreachable(world: &mut StreamingWorld) {
    world.transport.script_stream(StreamScript::Unreachable);
}

#[given("the fallback answers \"{answer}\"")]
fn fallback_answers(world: &mut StreamingWorld, answer: String) {
    world
        .transport
        .script_answer(AnswerScript::Answer(QaAnswer::new(answer)));
}

#[given("the fallback answers without text")]
fn fallback_without_text(world: &mut StreamingWorld) {
    world
        .transport
        .script_answer(AnswerScript::Answer(QaAnswer::missing()));
}

#[given("the fallback is unreachable")]
fn fallback_unreachable(world: &mut StreamingWorld) {
    world.transport.script_answer(AnswerScript::Unreachable);
}

#[when("the question is asked")]
fn question_is_asked(world: &mut StreamingWorld) -> Result<(), eyre::Report> {
    let query = world
        .query
        .clone()
        .ok_or_else(|| eyre!("a question should be prepared"))?;
    let consumer = StreamingConsumer::new(Arc::clone(&world.transport));
    let conversation = &world.conversation;
    let (outcome, elapsed) = world.runtime.block_on(async {
        let started = tokio::time::Instant::now();
        let outcome = consumer.ask(conversation, &query).await;
        (outcome, started.elapsed())
    });
    world.outcome = Some(outcome.wrap_err("turn should begin")?);
    world.elapsed = elapsed;
    Ok(())
}

#[then("the answer reads \"{text}\"")]
fn answer_reads(world: &StreamingWorld, text: String) -> Result<(), eyre::Report> {
    let answer = world.answer()?;
    if answer != text {
        return Err(eyre!(
            "expected answer {text:?}, got {answer:?} ({:?})",
            world.outcome
        ));
    }
    Ok(())
}

#[then("the transcript holds {count:usize} messages")]
fn transcript_holds(world: &StreamingWorld, count: usize) -> Result<(), eyre::Report> {
    let held = world.conversation.snapshot().messages().len();
    if held != count {
        return Err(eyre!("expected {count} messages, got {held}"));
    }
    Ok(())
}

#[then("{count:usize} fallback requests were issued")]
fn fallback_requests_issued(world: &StreamingWorld, count: usize) -> Result<(), eyre::Report> {
    let issued = world.transport.fallback_requests().len();
    if issued != count {
        return Err(eyre!("expected {count} fallback requests, got {issued}"));
    }
    Ok(())
}

#[then("at least {secs:u64} seconds have elapsed")]
fn seconds_elapsed(world: &StreamingWorld, secs: u64) -> Result<(), eyre::Report> {
    if world.elapsed < Duration::from_secs(secs) {
        return Err(eyre!(
            "expected at least {secs}s, only {:?} elapsed",
            world.elapsed
        ));
    }
    Ok(())
}

#[then("at most {secs:u64} seconds have elapsed")]
fn at_most_seconds_elapsed(world: &StreamingWorld, secs: u64) -> Result<(), eyre::Report> {
    if world.elapsed > Duration::from_secs(secs) {
        return Err(eyre!(
            "expected at most {secs}s, but {:?} elapsed",
            world.elapsed
        ));
    }
    Ok(())
}

#[then("the user sees the notice \"{notice}\"")]
fn user_sees_notice(world: &StreamingWorld, notice: String) -> Result<(), eyre::Report> {
    let notices = world.conversation.notices();
    if !notices.contains(&notice) {
        return Err(eyre!("expected notice {notice:?}, got {notices:?}"));
    }
    Ok(())
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Delimiter split across reads yields one message"
)]
fn delimiter_split_across_reads(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Multibyte character split across reads"
)]
fn multibyte_character_split(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Plain text response goes straight to the fallback"
)]
fn plain_text_goes_to_fallback(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Silent stream is cut off by the watchdog"
)]
fn silent_stream_cut_off(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Terminal marker without payload suppresses the fallback"
)]
fn terminal_marker_suppresses_fallback(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Missing fallback answer shows the no-response marker"
)]
fn missing_fallback_answer(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Failed fallback shows an explicit failure"
)]
fn failed_fallback(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Connection breaking before any frame falls back once"
)]
fn broken_connection_falls_back(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Connection breaking after a payload keeps the partial answer"
)]
fn broken_connection_keeps_partial(world: StreamingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/streaming.feature",
    name = "Keep-alive frames do not extend the watchdog"
)]
fn keep_alive_drip_hits_watchdog(world: StreamingWorld) {
    let _ = world;
}

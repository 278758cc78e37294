//! End-to-end question answering over HTTP against a mock compute service.

use std::sync::Arc;
use std::time::Duration;

use eyre::{WrapErr, ensure, eyre};
use odin::qa::{
    adapters::{HttpQaTransport, SharedConversation},
    domain::QaQuery,
    services::{StreamingConsumer, TurnOutcome},
};
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE_PATH: &str = "/docs/reports";
const QUESTION: &str = "What changed this quarter?";

fn consumer_for(server: &MockServer) -> StreamingConsumer<HttpQaTransport> {
    let transport = HttpQaTransport::new(reqwest::Client::new(), &server.uri());
    StreamingConsumer::new(Arc::new(transport)).with_watchdog(Duration::from_secs(2))
}

async fn mount_fallback(server: &MockServer, answer: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/qa"))
        .and(body_json(json!({ "base_path": BASE_PATH, "question": QUESTION })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": answer })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn ask(server: &MockServer) -> Result<(TurnOutcome, String), eyre::Report> {
    let conversation = SharedConversation::default();
    let outcome = consumer_for(server)
        .ask(&conversation, &QaQuery::new(BASE_PATH, QUESTION))
        .await
        .wrap_err("turn should begin")?;
    let answer = conversation
        .snapshot()
        .messages()
        .last()
        .map(|message| message.text().to_owned())
        .ok_or_else(|| eyre!("transcript is empty"))?;
    Ok((outcome, answer))
}

#[tokio::test]
async fn streamed_frames_fill_the_answer() -> Result<(), eyre::Report> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/qa/stream"))
        .and(query_param("base_path", BASE_PATH))
        .and(query_param("q", QUESTION))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: Revenue \n\ndata: grew.\n\nevent: done\n\n",
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_fallback(&server, "unused", 0).await;

    let (outcome, answer) = ask(&server).await?;

    ensure!(outcome == TurnOutcome::Terminated, "unexpected outcome {outcome:?}");
    ensure!(answer == "Revenue grew.", "unexpected answer {answer:?}");
    Ok(())
}

#[rstest]
#[case::plain_text(ResponseTemplate::new(200).set_body_string("42"))]
#[case::server_error(ResponseTemplate::new(500))]
#[case::empty_stream(ResponseTemplate::new(200).set_body_raw(": keep-alive\n\n", "text/event-stream"))]
#[tokio::test]
async fn unusable_stream_falls_back_once(
    #[case] stream_response: ResponseTemplate,
) -> Result<(), eyre::Report> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/qa/stream"))
        .respond_with(stream_response)
        .expect(1)
        .mount(&server)
        .await;
    mount_fallback(&server, "42", 1).await;

    let (outcome, answer) = ask(&server).await?;

    ensure!(outcome == TurnOutcome::Fallback, "unexpected outcome {outcome:?}");
    ensure!(answer == "42", "unexpected answer {answer:?}");
    Ok(())
}

#[tokio::test]
async fn failing_fallback_shows_failure_text() -> Result<(), eyre::Report> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/qa/stream"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/qa"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (outcome, answer) = ask(&server).await?;

    ensure!(outcome == TurnOutcome::Failed, "unexpected outcome {outcome:?}");
    ensure!(
        answer == "The answer could not be retrieved.",
        "unexpected answer {answer:?}"
    );
    Ok(())
}

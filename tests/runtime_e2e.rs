//! Full host session: launch, readiness relay, one question and shutdown.
#![cfg(unix)]

use std::os::unix::fs::symlink;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use eyre::{WrapErr, ensure, eyre};
use mockable::DefaultClock;
use odin::config::OdinConfig;
use odin::qa::{adapters::SharedConversation, domain::QaQuery, services::TurnOutcome};
use odin::readiness::domain::ReadinessReply;
use odin::runtime::BackendRuntime;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Lays out a development checkout whose interpreter is `/bin/sh`.
fn fake_checkout() -> Result<(TempDir, Utf8PathBuf), eyre::Report> {
    let dir = TempDir::new().wrap_err("temporary directory should be created")?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| eyre!("temporary path is not UTF-8: {}", path.display()))?;
    let bin = root.join(".venv_odin").join("bin");
    std::fs::create_dir_all(&bin).wrap_err("venv directory should be created")?;
    symlink("/bin/sh", bin.join("python")).wrap_err("interpreter link should be created")?;
    let backend = root.join("backend");
    std::fs::create_dir_all(&backend).wrap_err("backend directory should be created")?;
    std::fs::write(backend.join("server.py"), "exec sleep 30\n")
        .wrap_err("server script should be written")?;
    Ok((dir, root))
}

#[tokio::test]
async fn session_reports_ready_answers_and_stops() -> Result<(), eyre::Report> {
    let (_checkout, root) = fake_checkout()?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/qa/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: 안녕하세요\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let config = OdinConfig::development(root)
        .with_port(server.address().port())
        .with_health_interval(Duration::from_millis(100));
    let runtime = BackendRuntime::start(config, Arc::new(DefaultClock));
    let mut events = runtime.subscribe();
    ensure!(runtime.launched(), "fake service should have been launched");

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .wrap_err("readiness should be announced")?
        .ok_or_else(|| eyre!("readiness channel closed early"))?;
    ensure!(event.ready, "announced event should be ready: {event:?}");
    let reply = runtime.get_readiness();
    ensure!(reply == ReadinessReply { ready: true }, "unexpected reply {reply:?}");
    let checked = runtime.check_once().await;
    ensure!(checked.ok(), "live check should pass: {checked:?}");

    let conversation = SharedConversation::default();
    let outcome = runtime
        .consumer()
        .ask(&conversation, &QaQuery::new("/docs", "인사말은?"))
        .await
        .wrap_err("turn should begin")?;
    let answer = conversation
        .snapshot()
        .messages()
        .last()
        .map(|message| message.text().to_owned());
    ensure!(outcome == TurnOutcome::Streamed, "unexpected outcome {outcome:?}");
    ensure!(
        answer.as_deref() == Some("안녕하세요"),
        "unexpected answer {answer:?}"
    );

    runtime.shutdown().await;

    let status = runtime.supervisor().status();
    ensure!(
        status.is_some_and(|current| current.has_exited()),
        "compute service should have exited, got {status:?}"
    );
    ensure!(
        events.recv().await.is_none(),
        "subscriber channel should close on shutdown"
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_service_keeps_polling() -> Result<(), eyre::Report> {
    let (_checkout, root) = fake_checkout()?;
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .wrap_err("ephemeral port should be available")?;
        listener.local_addr().wrap_err("listener has an address")?.port()
    };
    let config = OdinConfig::development(root)
        .with_port(port)
        .with_health_interval(Duration::from_millis(50));
    let runtime = BackendRuntime::start(config, Arc::new(DefaultClock));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let reply = runtime.get_readiness();
    ensure!(!reply.ready, "closed port must not report ready");
    ensure!(runtime.is_polling(), "polling should continue while unreachable");
    runtime.shutdown().await;
    ensure!(!runtime.is_polling(), "shutdown should cancel polling");
    Ok(())
}

//! Blocking facade driven from a plain thread.
//!
//! The fake server runs on its own runtime so the test thread never owns an
//! async context.

mod common;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use common::{FakeServer, Reply, standard, tool};
use mcp_session::blocking::BlockingSession;
use mcp_session::handlers::HandlerError;
use mcp_session::{McpSession, SessionState};
use mcp_session_protocol::types::{LoggingMessageNotification, Root};
use serde_json::json;
use tokio::runtime::Runtime;

fn server_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn responder() -> common::Responder {
    standard(|request| match request.method.as_str() {
        "tools/list" => Reply::Result(json!({"tools": [tool("search"), tool("fetch")]})),
        "tools/call" => Reply::Result(json!({"content": [{"type": "text", "text": "done"}]})),
        _ => Reply::Result(json!({})),
    })
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_operations_from_plain_thread() {
    let runtime = server_runtime();
    let (server, client_end) = runtime.block_on(FakeServer::start(responder()));
    let session = BlockingSession::new(McpSession::builder().with_transport(client_end)).unwrap();

    let init = session.initialize().unwrap();
    assert_eq!(init.server_info.name, "fake-server");
    assert_eq!(session.state(), SessionState::Ready);

    let tools: Vec<String> = session
        .list_all_tools()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(tools, vec!["search", "fetch"]);

    let result = session.call_tool("search", None).unwrap();
    assert_eq!(result.content[0].as_text(), Some("done"));
    session.ping().unwrap();

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.ping().unwrap_err().is_session_closed());
    wait_until(|| server.peer_closed());
}

#[test]
fn test_notifications_and_reverse_requests_while_idle() {
    let runtime = server_runtime();
    let (server, client_end) = runtime.block_on(FakeServer::start(responder()));
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    let session = BlockingSession::new(
        McpSession::builder()
            .with_transport(client_end)
            .with_root(Root::new("file:///project", None))
            .on_logging_message(move |message: LoggingMessageNotification| {
                let _ = tx.lock().map(|tx| tx.send(message.data));
                async { Ok::<_, HandlerError>(()) }
            }),
    )
    .unwrap();
    session.initialize().unwrap();

    runtime.block_on(server.notify(
        "notifications/message",
        Some(json!({"level": "info", "data": "indexing"})),
    ));
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        json!("indexing")
    );

    let response = runtime.block_on(server.request("roots/list", None));
    assert_eq!(
        response.result(),
        Some(&json!({"roots": [{"uri": "file:///project"}]}))
    );

    session.add_root(Root::new("file:///other", None)).unwrap();
    assert_eq!(session.list_roots().unwrap().len(), 2);
    runtime.block_on(server.wait_for("notifications/roots/list_changed", 1));
}

#[test]
fn test_drop_disconnects() {
    let runtime = server_runtime();
    let (server, client_end) = runtime.block_on(FakeServer::start(responder()));
    let session = BlockingSession::new(McpSession::builder().with_transport(client_end)).unwrap();
    session.ping().unwrap();

    drop(session);
    wait_until(|| server.peer_closed());
}

#[test]
fn test_graceful_close_waits_for_in_flight_call() {
    let runtime = server_runtime();
    let (server, client_end) = runtime.block_on(FakeServer::start(standard(|request| {
        match request.method.as_str() {
            "slow" => Reply::Delay(Duration::from_millis(100), json!({"ok": true})),
            _ => Reply::Result(json!({})),
        }
    })));
    let session = std::sync::Arc::new(
        BlockingSession::new(McpSession::builder().with_transport(client_end)).unwrap(),
    );
    session.initialize().unwrap();

    let caller = {
        let session = std::sync::Arc::clone(&session);
        std::thread::spawn(move || session.send_request("slow", None, None))
    };
    runtime.block_on(server.wait_for("slow", 1));

    session.close_gracefully();
    assert_eq!(caller.join().unwrap().unwrap(), json!({"ok": true}));
    assert_eq!(session.state(), SessionState::Closed);
}

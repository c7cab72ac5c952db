//! Root registry behaviour through the session.

mod common;

use std::time::Duration;

use common::{FakeServer, echo_empty};
use mcp_session::SessionState;
use mcp_session_protocol::ErrorKind;
use mcp_session_protocol::types::Root;
use pretty_assertions::assert_eq;
use serde_json::json;

const ROOTS_CHANGED: &str = "notifications/roots/list_changed";

fn root(uri: &str) -> Root {
    Root::new(uri, None)
}

#[tokio::test]
async fn test_add_duplicate_and_missing_remove() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;

    session
        .add_root(Root::new("file:///a", Some("A".to_string())))
        .await
        .unwrap();
    server.wait_for(ROOTS_CHANGED, 1).await;

    let err = session.add_root(root("file:///a")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    assert!(err.message.contains("file:///a"));

    let err = session.remove_root("file:///b").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Root with uri 'file:///b' not found");

    session.ping().await.unwrap();
    assert_eq!(server.notifications(ROOTS_CHANGED), 1);
    assert_eq!(
        session.list_roots().await,
        vec![Root::new("file:///a", Some("A".to_string()))]
    );
}

#[tokio::test]
async fn test_mutation_runs_handshake_before_notifying() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;
    assert_eq!(session.state(), SessionState::Uninitialized);

    session.add_root(root("file:///first")).await.unwrap();
    assert!(session.is_ready());

    server.wait_for(ROOTS_CHANGED, 1).await;
    let methods: Vec<String> = server
        .received()
        .iter()
        .filter_map(|m| m.method().map(str::to_string))
        .collect();
    assert_eq!(
        methods,
        vec![
            "initialize".to_string(),
            "notifications/initialized".to_string(),
            ROOTS_CHANGED.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_no_roots_capability_means_no_notification() {
    let (server, session) = FakeServer::session(echo_empty()).await;

    session.add_root(root("file:///quiet")).await.unwrap();
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert_eq!(session.remove_root("file:///quiet").await.unwrap().uri, "file:///quiet");

    session.ping().await.unwrap();
    assert_eq!(server.notifications(ROOTS_CHANGED), 0);
}

#[tokio::test]
async fn test_each_mutation_sends_one_notification() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;
    session.initialize().await.unwrap();

    session.add_root(root("file:///x")).await.unwrap();
    session.add_root(root("file:///y")).await.unwrap();
    let removed = session.remove_root("file:///x").await.unwrap();
    assert_eq!(removed.uri, "file:///x");

    server.wait_for(ROOTS_CHANGED, 3).await;
    session.ping().await.unwrap();
    assert_eq!(server.notifications(ROOTS_CHANGED), 3);
}

#[tokio::test]
async fn test_concurrent_disjoint_mutations() {
    let initial: Vec<Root> = (0..10).map(|n| root(&format!("file:///old/{n}"))).collect();
    let (server, session) = FakeServer::session_with(echo_empty(), |builder| {
        builder.with_roots(initial)
    })
    .await;
    session.initialize().await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..10 {
        let adder = session.clone();
        tasks.push(tokio::spawn(async move {
            adder.add_root(root(&format!("file:///new/{n}"))).await
        }));
        let remover = session.clone();
        tasks.push(tokio::spawn(async move {
            remover
                .remove_root(&format!("file:///old/{n}"))
                .await
                .map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut uris: Vec<String> = session.list_roots().await.into_iter().map(|r| r.uri).collect();
    uris.sort();
    let mut expected: Vec<String> = (0..10).map(|n| format!("file:///new/{n}")).collect();
    expected.sort();
    assert_eq!(uris, expected);

    server.wait_for(ROOTS_CHANGED, 20).await;
    session.ping().await.unwrap();
    assert_eq!(server.notifications(ROOTS_CHANGED), 20);
}

#[tokio::test]
async fn test_concurrent_duplicate_add_has_one_winner() {
    let (_server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;
    session.initialize().await.unwrap();

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.add_root(root("file:///contested")).await })
        })
        .collect();

    let mut succeeded = 0;
    for attempt in attempts {
        if attempt.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(session.list_roots().await.len(), 1);
}

#[tokio::test]
async fn test_empty_uri_is_rejected() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;

    let err = session.add_root(root("")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    assert!(session.list_roots().await.is_empty());
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_server_sees_roots_added_at_runtime() {
    let (server, session) = FakeServer::session_with(echo_empty(), |builder| {
        builder.with_root(Root::new("file:///seed", Some("Seed".to_string())))
    })
    .await;
    session.initialize().await.unwrap();

    session.add_root(root("file:///later")).await.unwrap();
    let response = server.request("roots/list", None).await;
    assert_eq!(
        response.result(),
        Some(&json!({"roots": [
            {"uri": "file:///seed", "name": "Seed"},
            {"uri": "file:///later"}
        ]}))
    );
}

#[tokio::test]
async fn test_mutation_after_close_stays_local() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;
    session.initialize().await.unwrap();
    session.close().await;

    session.add_root(root("file:///after")).await.unwrap();
    assert_eq!(session.list_roots().await.len(), 1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(server.notifications(ROOTS_CHANGED), 0);
}

#[tokio::test]
async fn test_explicit_roots_changed_notification() {
    let (server, session) =
        FakeServer::session_with(echo_empty(), |builder| builder.with_roots_capability(true)).await;
    session.initialize().await.unwrap();

    session.roots_list_changed_notification().await.unwrap();
    server.wait_for(ROOTS_CHANGED, 1).await;

    session.close().await;
    assert!(
        session
            .roots_list_changed_notification()
            .await
            .unwrap_err()
            .is_session_closed()
    );
}

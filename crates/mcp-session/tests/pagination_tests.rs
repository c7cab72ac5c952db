//! Cursor pagination against a scripted server.

mod common;

use common::{FakeServer, Reply, standard, tool};
use futures::StreamExt;
use mcp_session::pagination::pages;
use mcp_session_protocol::ErrorKind;
use mcp_session_protocol::types::Cursor;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn cursor_of(params: Option<&Value>) -> Option<String> {
    params
        .and_then(|p| p.get("cursor"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `tools/list` in three pages: [a, b] -> c1 -> [c] -> c2 -> [d]
fn three_page_tools() -> common::Responder {
    standard(|request| match request.method.as_str() {
        "tools/list" => match cursor_of(request.params.as_ref()).as_deref() {
            None => Reply::Result(json!({"tools": [tool("a"), tool("b")], "nextCursor": "c1"})),
            Some("c1") => Reply::Result(json!({"tools": [tool("c")], "nextCursor": "c2"})),
            Some("c2") => Reply::Result(json!({"tools": [tool("d")]})),
            Some(_) => Reply::error(-32602, "bad cursor"),
        },
        _ => Reply::Result(json!({})),
    })
}

#[tokio::test]
async fn test_list_all_issues_one_request_per_page() {
    let (server, session) = FakeServer::session(three_page_tools()).await;

    let names = session.list_tool_names().await.unwrap();
    assert_eq!(names, vec!["a", "b", "c", "d"]);

    let cursors: Vec<Option<String>> = server
        .requests("tools/list")
        .iter()
        .map(|r| cursor_of(r.params.as_ref()))
        .collect();
    assert_eq!(
        cursors,
        vec![None, Some("c1".to_string()), Some("c2".to_string())]
    );
}

#[tokio::test]
async fn test_single_page_fetch_exposes_cursor() {
    let (_server, session) = FakeServer::session(three_page_tools()).await;

    let first = session.list_tools(None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.next_cursor.as_deref(), Some("c1"));
    assert!(!first.is_last());

    let last = session.list_tools(Some("c2".to_string())).await.unwrap();
    assert!(last.is_last());
    assert_eq!(last.items[0].name, "d");
}

#[tokio::test]
async fn test_empty_cursor_is_first_page_and_end_marker() {
    let responder = standard(|request| match request.method.as_str() {
        "prompts/list" => match cursor_of(request.params.as_ref()) {
            None => Reply::Result(json!({"prompts": [{"name": "only"}], "nextCursor": ""})),
            Some(other) => Reply::error(-32602, &format!("unexpected cursor {other}")),
        },
        _ => Reply::Result(json!({})),
    });
    let (server, session) = FakeServer::session(responder).await;

    let page = session.list_prompts(Some(String::new())).await.unwrap();
    assert!(page.is_last());

    let all = session.list_all_prompts().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(server.requests("prompts/list").len(), 2);
}

#[tokio::test]
async fn test_error_mid_walk_aborts_listing() {
    let responder = standard(|request| match request.method.as_str() {
        "resources/list" => match cursor_of(request.params.as_ref()).as_deref() {
            None => Reply::Result(json!({
                "resources": [{"name": "a", "uri": "file:///a"}],
                "nextCursor": "broken"
            })),
            _ => Reply::error(-32603, "storage offline"),
        },
        _ => Reply::Result(json!({})),
    });
    let (server, session) = FakeServer::session(responder).await;

    let err = session.list_all_resources().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Rpc);
    assert_eq!(err.message, "storage offline");
    assert_eq!(server.requests("resources/list").len(), 2);
}

#[tokio::test]
async fn test_resource_templates_across_pages() {
    let responder = standard(|request| match request.method.as_str() {
        "resources/templates/list" => match cursor_of(request.params.as_ref()).as_deref() {
            None => Reply::Result(json!({
                "resourceTemplates": [{"name": "file", "uriTemplate": "file:///{path}"}],
                "nextCursor": "t2"
            })),
            _ => Reply::Result(json!({
                "resourceTemplates": [{"name": "db", "uriTemplate": "db://{table}"}]
            })),
        },
        _ => Reply::Result(json!({})),
    });
    let (_server, session) = FakeServer::session(responder).await;

    let templates = session.list_all_resource_templates().await.unwrap();
    let uris: Vec<&str> = templates.iter().map(|t| t.uri_template.as_str()).collect();
    assert_eq!(uris, vec!["file:///{path}", "db://{table}"]);
}

#[tokio::test]
async fn test_page_stream_walks_lazily() {
    let (server, session) = FakeServer::session(three_page_tools()).await;

    let mut stream = Box::pin(pages(|cursor: Option<Cursor>| session.list_tools(cursor)));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(server.requests("tools/list").len(), 1);

    let rest: Vec<_> = stream.collect().await;
    assert_eq!(rest.len(), 2);
    assert!(rest.iter().all(Result::is_ok));
    assert_eq!(server.requests("tools/list").len(), 3);
}

//! Shared test harness: a scripted MCP server on the far end of a
//! [`ChannelTransport`] pair.
//!
//! The server records every envelope the client sends, answers client
//! requests through a responder closure, and can push notifications and
//! server-initiated requests to the client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mcp_session::{McpSession, SessionBuilder};
use mcp_session_protocol::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
};
use mcp_session_transport::{ChannelTransport, Transport, TransportMessage};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// How the fake server answers one client request
#[derive(Debug, Clone)]
pub enum Reply {
    /// Success with this result
    Result(Value),
    /// Error response
    Error { code: i32, message: String, data: Option<Value> },
    /// Never answer
    Ignore,
    /// Answer with this result after a delay
    Delay(Duration, Value),
}

impl Reply {
    pub fn error(code: i32, message: &str) -> Self {
        Self::Error {
            code,
            message: message.to_string(),
            data: None,
        }
    }
}

pub type Responder = Arc<dyn Fn(&JsonRpcRequest) -> Reply + Send + Sync>;

/// Install a fmt subscriber when `RUST_LOG` is set.
pub fn init_test_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// `initialize` result advertising every server capability
pub fn initialize_result() -> Value {
    initialize_result_with_version(mcp_session_protocol::LATEST_PROTOCOL_VERSION)
}

pub fn initialize_result_with_version(version: &str) -> Value {
    json!({
        "protocolVersion": version,
        "capabilities": {
            "tools": {"listChanged": true},
            "resources": {"subscribe": true, "listChanged": true},
            "prompts": {"listChanged": true},
            "logging": {},
            "completions": {}
        },
        "serverInfo": {"name": "fake-server", "version": "9.9.9"},
        "instructions": "Test server"
    })
}

pub fn tool(name: &str) -> Value {
    json!({"name": name, "inputSchema": {"type": "object"}})
}

/// Answers `initialize` and `ping`; everything else goes to `fallback`.
pub fn standard<F>(fallback: F) -> Responder
where
    F: Fn(&JsonRpcRequest) -> Reply + Send + Sync + 'static,
{
    Arc::new(move |request: &JsonRpcRequest| match request.method.as_str() {
        "initialize" => Reply::Result(initialize_result()),
        "ping" => Reply::Result(json!({})),
        _ => fallback(request),
    })
}

/// Answers `initialize`, `ping` and anything else with `{}`.
pub fn echo_empty() -> Responder {
    standard(|_| Reply::Result(json!({})))
}

#[derive(Default)]
struct Shared {
    peer_closed: std::sync::atomic::AtomicBool,
    received: Mutex<Vec<JsonRpcMessage>>,
    waiting: Mutex<HashMap<RequestId, oneshot::Sender<JsonRpcResponse>>>,
}

/// Server end of the channel pair
#[derive(Clone)]
pub struct FakeServer {
    transport: Arc<ChannelTransport>,
    shared: Arc<Shared>,
    next_id: Arc<std::sync::atomic::AtomicI64>,
}

impl FakeServer {
    /// Start a server; returns it with the client end of the transport.
    pub async fn start(responder: Responder) -> (Self, ChannelTransport) {
        init_test_tracing();
        let (client_end, server_end) = ChannelTransport::pair();
        server_end.connect().await.expect("server end connects");
        let server = Self {
            transport: Arc::new(server_end),
            shared: Arc::new(Shared::default()),
            next_id: Arc::new(std::sync::atomic::AtomicI64::new(1000)),
        };
        tokio::spawn(server.clone().serve(responder));
        (server, client_end)
    }

    /// Start a server and build a session against it.
    pub async fn session(responder: Responder) -> (Self, McpSession) {
        Self::session_with(responder, |builder| builder).await
    }

    /// Like [`FakeServer::session`] with extra builder settings.
    pub async fn session_with(
        responder: Responder,
        configure: impl FnOnce(SessionBuilder) -> SessionBuilder,
    ) -> (Self, McpSession) {
        let (server, client_end) = Self::start(responder).await;
        let session = configure(McpSession::builder().with_transport(client_end))
            .build()
            .expect("session builds");
        (server, session)
    }

    async fn serve(self, responder: Responder) {
        while let Ok(Some(message)) = self.transport.receive().await {
            let message =
                JsonRpcMessage::from_slice(&message.payload).expect("client sends valid JSON-RPC");
            self.shared.received.lock().push(message.clone());
            match message {
                JsonRpcMessage::Request(request) => {
                    let reply = responder(&request);
                    let server = self.clone();
                    tokio::spawn(async move { server.answer(request.id, reply).await });
                }
                JsonRpcMessage::Response(response) => {
                    let waiter = response
                        .id
                        .as_ref()
                        .and_then(|id| self.shared.waiting.lock().remove(id));
                    if let Some(waiter) = waiter {
                        let _ = waiter.send(response);
                    }
                }
                JsonRpcMessage::Notification(_) => {}
            }
        }
        self.shared
            .peer_closed
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Whether the client end went away
    pub fn peer_closed(&self) -> bool {
        self.shared
            .peer_closed
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn answer(&self, id: RequestId, reply: Reply) {
        let response = match reply {
            Reply::Result(result) => JsonRpcResponse::success(result, id),
            Reply::Error {
                code,
                message,
                data,
            } => {
                let mut error = JsonRpcError::new(code, message);
                error.data = data;
                JsonRpcResponse::error_response(error, id)
            }
            Reply::Ignore => return,
            Reply::Delay(delay, result) => {
                tokio::time::sleep(delay).await;
                JsonRpcResponse::success(result, id)
            }
        };
        let _ = self.send(JsonRpcMessage::Response(response)).await;
    }

    /// Write an envelope to the client.
    pub async fn send(&self, message: JsonRpcMessage) -> mcp_session_transport::TransportResult<()> {
        let payload = message.to_vec().expect("envelope serializes");
        self.transport.send(TransportMessage::new(payload)).await
    }

    /// Write raw bytes to the client.
    pub async fn send_raw(&self, payload: &[u8]) {
        self.transport
            .send(TransportMessage::new(payload.to_vec()))
            .await
            .expect("raw send");
    }

    /// Push a notification to the client.
    pub async fn notify(&self, method: &str, params: Option<Value>) {
        self.send(JsonRpcMessage::Notification(JsonRpcNotification::new(
            method, params,
        )))
        .await
        .expect("notification sent");
    }

    /// Send a server-initiated request and wait for the client's answer.
    pub async fn request(&self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        let id = RequestId::Number(
            self.next_id
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst),
        );
        let (tx, rx) = oneshot::channel();
        self.shared.waiting.lock().insert(id.clone(), tx);
        self.send(JsonRpcMessage::Request(JsonRpcRequest::new(method, params, id)))
            .await
            .expect("request sent");
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("client answered in time")
            .expect("answer delivered")
    }

    /// Answer a request the responder chose to ignore.
    pub async fn respond(&self, id: RequestId, result: Value) {
        self.answer(id, Reply::Result(result)).await;
    }

    /// Drop the connection from the server side.
    pub async fn disconnect(&self) {
        self.transport.disconnect().await.expect("server disconnects");
    }

    /// Every envelope received so far
    pub fn received(&self) -> Vec<JsonRpcMessage> {
        self.shared.received.lock().clone()
    }

    /// Client requests received for `method`
    pub fn requests(&self, method: &str) -> Vec<JsonRpcRequest> {
        self.received()
            .into_iter()
            .filter_map(|message| match message {
                JsonRpcMessage::Request(request) if request.method == method => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Client notifications received for `method`
    pub fn notifications(&self, method: &str) -> usize {
        self.received()
            .iter()
            .filter(|message| {
                matches!(message, JsonRpcMessage::Notification(n) if n.method == method)
            })
            .count()
    }

    /// Wait until `count` envelopes with `method` have arrived.
    pub async fn wait_for(&self, method: &str, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let seen = self
                .received()
                .iter()
                .filter(|message| message.method() == Some(method))
                .count();
            if seen >= count {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} x {method}, saw {seen}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

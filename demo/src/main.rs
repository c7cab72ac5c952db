//! MCP client session walkthrough.
//!
//! Runs a small scripted server and a client session in one process, joined
//! by an in-memory channel transport. The client lists and calls tools,
//! reads a resource, answers the server's sampling request and reacts to a
//! tool list change.
//!
//! ```bash
//! RUST_LOG=mcp_session=debug cargo run -p mcp-session-demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use mcp_session::McpSession;
use mcp_session::handlers::{HandlerError, HandlerResult, SamplingHandler};
use mcp_session_protocol::types::{
    CallToolRequest, ContentBlock, CreateMessageRequest, CreateMessageResult, LoggingLevel,
    LoggingMessageNotification, Role, Root, StopReason, Tool,
};
use mcp_session_protocol::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    LATEST_PROTOCOL_VERSION, RequestId, methods,
};
use mcp_session_transport::{ChannelTransport, Transport, TransportMessage};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Answers sampling requests with a canned completion
#[derive(Debug)]
struct CannedSampler;

#[async_trait]
impl SamplingHandler for CannedSampler {
    async fn handle_create_message(
        &self,
        request: CreateMessageRequest,
    ) -> HandlerResult<CreateMessageResult> {
        let question = request
            .messages
            .last()
            .and_then(|m| m.content.as_text())
            .ok_or_else(|| HandlerError::InvalidInput {
                details: "sampling request has no text message".to_string(),
            })?;
        info!("Server asked the model: {}", question);

        Ok(CreateMessageResult {
            role: Role::Assistant,
            content: ContentBlock::text(format!("{} characters, looks fine", question.len())),
            model: "demo-model".to_string(),
            stop_reason: Some(StopReason::EndTurn),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (client_end, server_end) = ChannelTransport::pair();
    let server = tokio::spawn(serve(server_end));

    let session = McpSession::builder()
        .with_transport(client_end)
        .with_request_timeout(Duration::from_secs(5))
        .with_root(Root::new("file:///workspace", Some("Workspace".to_string())))
        .with_sampling_handler(Arc::new(CannedSampler))
        .on_tools_changed(|tools: Vec<Tool>| async move {
            let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
            info!("Tool list changed: {}", names.join(", "));
            Ok::<_, HandlerError>(())
        })
        .on_logging_message(|message: LoggingMessageNotification| async move {
            info!("[server {}] {}", message.level, message.data);
            Ok::<_, HandlerError>(())
        })
        .build()?;

    let init = session.initialize().await?;
    info!(
        "Connected to {} {} (protocol {})",
        init.server_info.name, init.server_info.version, init.protocol_version
    );

    session.set_logging_level(LoggingLevel::Info).await?;

    let tools = session.list_all_tools().await?;
    info!("{} tool(s) across all pages", tools.len());

    let result = session
        .call_tool_with(
            CallToolRequest::new("review")
                .with_arguments(
                    [("path".to_string(), json!("src/main.rs"))]
                        .into_iter()
                        .collect(),
                )
                .with_progress_token("review-1"),
        )
        .await?;
    for block in &result.content {
        if let Some(text) = block.as_text() {
            info!("review: {}", text);
        }
    }

    let contents = session.read_resource("file:///workspace/README.md").await?;
    info!("README has {} content block(s)", contents.contents.len());

    session.add_root(Root::new("file:///scratch", None)).await?;

    // Let the list-changed refetch and log lines drain before closing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    session.close_gracefully().await;
    server.await.context("server task panicked")??;
    Ok(())
}

/// The scripted server side of the pair
async fn serve(transport: ChannelTransport) -> anyhow::Result<()> {
    transport.connect().await?;
    let mut next_id = 0i64;

    while let Some(message) = transport.receive().await? {
        match JsonRpcMessage::from_slice(&message.payload)? {
            JsonRpcMessage::Request(request) => {
                let follow_up = request.method == methods::TOOLS_CALL;
                let response = answer(&request);
                send(&transport, JsonRpcMessage::Response(response)).await?;

                if follow_up {
                    // The call changed what the server offers.
                    let changed = JsonRpcNotification::new(methods::TOOLS_LIST_CHANGED, None);
                    send(&transport, JsonRpcMessage::Notification(changed)).await?;
                }
            }
            JsonRpcMessage::Notification(notification) => {
                if notification.method == methods::INITIALIZED {
                    next_id += 1;
                    let sampling = JsonRpcRequest::new(
                        methods::SAMPLING_CREATE_MESSAGE,
                        Some(json!({
                            "messages": [{
                                "role": "user",
                                "content": {"type": "text", "text": "Is this diff safe to merge?"}
                            }],
                            "maxTokens": 64
                        })),
                        next_id,
                    );
                    send(&transport, JsonRpcMessage::Request(sampling)).await?;
                }
                if notification.method == methods::ROOTS_LIST_CHANGED {
                    next_id += 1;
                    let list = JsonRpcRequest::new(methods::ROOTS_LIST, None, next_id);
                    send(&transport, JsonRpcMessage::Request(list)).await?;
                }
            }
            JsonRpcMessage::Response(response) => match response.into_result() {
                Ok(result) => info!("Client answered: {}", result),
                Err(e) => warn!("Client returned an error: {}", e),
            },
        }
    }

    info!("Client went away, server stopping");
    Ok(())
}

fn answer(request: &JsonRpcRequest) -> JsonRpcResponse {
    let id: RequestId = request.id.clone();
    let cursor = request
        .params
        .as_ref()
        .and_then(|p| p.get("cursor"))
        .and_then(Value::as_str);

    let result = match (request.method.as_str(), cursor) {
        (methods::INITIALIZE, _) => json!({
            "protocolVersion": LATEST_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": true},
                "resources": {},
                "logging": {}
            },
            "serverInfo": {"name": "demo-server", "version": "0.1.0"}
        }),
        (methods::TOOLS_LIST, None) => json!({
            "tools": [{"name": "review", "inputSchema": {"type": "object"}}],
            "nextCursor": "page-2"
        }),
        (methods::TOOLS_LIST, Some(_)) => json!({
            "tools": [{"name": "format", "inputSchema": {"type": "object"}}]
        }),
        (methods::TOOLS_CALL, _) => json!({
            "content": [{"type": "text", "text": "No issues found"}]
        }),
        (methods::RESOURCES_READ, _) => json!({
            "contents": [{"uri": "file:///workspace/README.md", "text": "# Demo"}]
        }),
        (methods::PING | methods::LOGGING_SET_LEVEL, _) => json!({}),
        (other, _) => {
            return JsonRpcResponse::error_response(JsonRpcError::method_not_found(other), id);
        }
    };
    JsonRpcResponse::success(result, id)
}

async fn send(transport: &ChannelTransport, message: JsonRpcMessage) -> anyhow::Result<()> {
    let payload = message.to_vec()?;
    transport.send(TransportMessage::new(payload)).await?;
    Ok(())
}

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};

use agent_core::error::{AgentError, Result};
use agent_core::gateway::{
    PromptResult, ResourceContent, ResourceDescriptor, ServerInfo, SessionGateway,
};
use agent_core::tool::{ToolDescriptor, ToolResultPayload};

use super::launch::ServerLaunch;
use super::protocol::{
    self, GetPromptResult, Inbound, InitializeResult, ListResourcesResult, ListToolsResult,
    Outgoing, RawMessage, ReadResourceResult,
};

type Responder = oneshot::Sender<Result<Value>>;

/// Session gateway over a child-process MCP server
///
/// The child is killed if the client is dropped without [`close`](SessionGateway::close).
#[derive(Clone)]
pub struct McpClient {
    inner: Arc<Inner>,
}

struct Inner {
    label: String,
    child: Mutex<Option<Child>>,
    writer: Mutex<Option<BufWriter<ChildStdin>>>,
    pending: Mutex<HashMap<u64, Responder>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    /// Set once the server's output ends; guarded by `pending`
    disconnected: AtomicBool,
}

impl McpClient {
    /// Start the server process. The handshake happens in
    /// [`initialize`](SessionGateway::initialize).
    pub fn spawn(launch: &ServerLaunch) -> Result<Self> {
        let label = launch.label();
        let mut child = Command::new(&launch.command)
            .args(&launch.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::Connection(format!("failed to start {label}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Connection(format!("{label}: stdin unavailable")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Connection(format!("{label}: stdout unavailable")))?;

        info!(server = %label, command = %launch.command, "Started tool server");

        let inner = Arc::new(Inner {
            label,
            child: Mutex::new(Some(child)),
            writer: Mutex::new(Some(BufWriter::new(stdin))),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
        });

        let reader = Arc::clone(&inner);
        tokio::spawn(async move { reader.reader_loop(stdout).await });

        Ok(Self { inner })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.inner.send_request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| AgentError::Protocol(format!("malformed {method} result: {e}")))
    }
}

impl Inner {
    async fn reader_loop(self: Arc<Self>, stdout: ChildStdout) {
        let mut lines = LinesStream::new(BufReader::new(stdout).lines());

        while let Some(line) = lines.next().await {
            let raw = match line {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(server = %self.label, error = %e, "Failed to read from tool server");
                    break;
                }
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<RawMessage>(trimmed) {
                Ok(message) => self.dispatch(message.into()).await,
                Err(e) => warn!(server = %self.label, line = trimmed, error = %e, "Ignoring non-JSON line"),
            }
        }

        debug!(server = %self.label, "Tool server output closed");
        self.disconnect().await;
    }

    /// No response can arrive any more: fail what is waiting and refuse new requests
    async fn disconnect(&self) {
        let mut pending = self.pending.lock().await;
        self.disconnected.store(true, Ordering::SeqCst);
        for (_, responder) in pending.drain() {
            let _ = responder.send(Err(AgentError::Connection(
                "tool server closed the connection".into(),
            )));
        }
    }

    async fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::Response { id, outcome } => {
                let Some(key) = id.as_u64() else {
                    debug!(server = %self.label, ?id, "Response with foreign id");
                    return;
                };
                let Some(responder) = self.pending.lock().await.remove(&key) else {
                    debug!(server = %self.label, id = key, "Response for unknown request");
                    return;
                };
                let outcome = outcome.map_err(|e| {
                    AgentError::Protocol(format!("{} (code {})", e.message, e.code))
                });
                let _ = responder.send(outcome);
            }
            Inbound::Request { id, method } => {
                let reply = if method == "ping" {
                    protocol::response(id, json!({}))
                } else {
                    warn!(server = %self.label, method = %method, "Unsupported server request");
                    protocol::error_response(
                        id,
                        protocol::METHOD_NOT_FOUND,
                        format!("client does not implement method '{method}'"),
                    )
                };
                if let Err(e) = self.write(&reply).await {
                    warn!(server = %self.label, error = %e, "Failed to answer server request");
                }
            }
            Inbound::Notification { method } => {
                debug!(server = %self.label, method = %method, "Server notification");
            }
            Inbound::Unknown => {
                debug!(server = %self.label, "Ignoring message without id or method");
            }
        }
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AgentError::Connection(format!("{} session is closed", self.label)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(AgentError::Connection(format!(
                    "{} closed the connection",
                    self.label
                )));
            }
            pending.insert(id, tx);
        }

        debug!(server = %self.label, id, method, "Sending request");
        if let Err(e) = self.write(&Outgoing::request(id, method, params)).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        rx.await.map_err(|_| {
            AgentError::Connection(format!("{} dropped request {method}", self.label))
        })?
    }

    async fn notify(&self, method: &str, params: Value) -> Result<()> {
        self.write(&Outgoing::notification(method, params)).await
    }

    async fn write<T: serde::Serialize>(&self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| AgentError::Connection(format!("{} session is closed", self.label)))?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AgentError::Connection(format!("write to {} failed: {e}", self.label)))?;
        writer
            .flush()
            .await
            .map_err(|e| AgentError::Connection(format!("write to {} failed: {e}", self.label)))
    }

    async fn fail_pending(&self, reason: &str) {
        for (_, responder) in self.pending.lock().await.drain() {
            let _ = responder.send(Err(AgentError::Connection(reason.to_string())));
        }
    }
}

#[async_trait]
impl SessionGateway for McpClient {
    async fn initialize(&self) -> Result<ServerInfo> {
        let result: InitializeResult = self
            .request("initialize", protocol::initialize_params())
            .await
            .map_err(|e| AgentError::Connection(format!("handshake failed: {e}")))?;
        self.inner
            .notify("notifications/initialized", json!({}))
            .await?;

        let info = ServerInfo::from(result);
        info!(server = %info.name, version = ?info.version, "Tool session established");
        Ok(info)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.map_or_else(|| json!({}), |c| json!({ "cursor": c }));
            let page: ListToolsResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(tools)
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        let mut resources = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.map_or_else(|| json!({}), |c| json!({ "cursor": c }));
            let page: ListResourcesResult = self.request("resources/list", params).await?;
            resources.extend(page.resources);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(resources)
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>> {
        let result: ReadResourceResult = self
            .request("resources/read", json!({ "uri": uri }))
            .await?;
        Ok(result.contents)
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolResultPayload> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn get_prompt(&self, name: &str, arguments: HashMap<String, String>) -> Result<PromptResult> {
        let result: GetPromptResult = self
            .request("prompts/get", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Dropping stdin tells a well-behaved server to exit
        self.inner.writer.lock().await.take();

        if let Some(mut child) = self.inner.child.lock().await.take() {
            let exited = tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await;
            if exited.is_err() {
                warn!(server = %self.inner.label, "Tool server did not exit, killing it");
                child
                    .kill()
                    .await
                    .map_err(|e| AgentError::Connection(format!("failed to stop server: {e}")))?;
            }
        }

        self.inner.fail_pending("session closed").await;
        info!(server = %self.inner.label, "Tool session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_missing_interpreter_is_connection_error() {
        let launch = ServerLaunch {
            command: "definitely-not-an-interpreter-7f3a".into(),
            args: vec!["server.py".into()],
            script: "server.py".into(),
        };
        let err = McpClient::spawn(&launch).err().unwrap();
        assert!(matches!(err, AgentError::Connection(_)));
    }

    /// Line-oriented stand-in for an MCP server.
    ///
    /// It only sends its own `ping` and `sampling/createMessage` requests after
    /// `notifications/initialized`, and holds the `tools/list` answer until both
    /// replies came back well-formed. `slow` and `fast` calls are answered
    /// together, `fast` first.
    #[cfg(unix)]
    const SCRIPTED_SERVER: &str = r#"
ping_ok=no
unknown_ok=no
tools_id=
slow_id=
fast_id=
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\([0-9]*\),.*/\1/p')
  case "$line" in
    *'"id":"srv-1"'*)
      case "$line" in *'"result":{}'*) ping_ok=yes ;; esac ;;
    *'"id":"srv-2"'*)
      case "$line" in *'"code":-32601'*) unknown_ok=yes ;; esac ;;
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"scripted","version":"0.1.0"}}}\n' "$id" ;;
    *'"method":"notifications/initialized"'*)
      echo '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info","data":"ready"}}'
      echo '{"jsonrpc":"2.0","id":"srv-1","method":"ping"}'
      echo '{"jsonrpc":"2.0","id":"srv-2","method":"sampling/createMessage","params":{}}' ;;
    *'"method":"tools/list"'*)
      tools_id=$id ;;
    *'"name":"slow"'*)
      slow_id=$id ;;
    *'"name":"fast"'*)
      fast_id=$id ;;
    *'"name":"broken"'*)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32602,"message":"unknown arguments"}}\n' "$id" ;;
  esac
  if [ -n "$tools_id" ] && [ "$ping_ok" = yes ] && [ "$unknown_ok" = yes ]; then
    printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","inputSchema":{"type":"object"}}]}}\n' "$tools_id"
    tools_id=
  fi
  if [ -n "$slow_id" ] && [ -n "$fast_id" ]; then
    printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"fast"}]}}\n' "$fast_id"
    printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"slow"}]}}\n' "$slow_id"
    slow_id=
    fast_id=
  fi
done
"#;

    #[cfg(unix)]
    fn shell(script: &str) -> ServerLaunch {
        ServerLaunch {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            script: "scripted.sh".into(),
        }
    }

    #[cfg(unix)]
    async fn within<T>(future: impl std::future::Future<Output = T>) -> T {
        tokio::time::timeout(Duration::from_secs(10), future)
            .await
            .expect("tool server did not answer in time")
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_against_scripted_server() {
        let client = McpClient::spawn(&shell(SCRIPTED_SERVER)).unwrap();

        let info = within(client.initialize()).await.unwrap();
        assert_eq!(info.name, "scripted");
        assert_eq!(info.version.as_deref(), Some("0.1.0"));
        assert_eq!(info.protocol_version.as_deref(), Some("2024-11-05"));

        // only answered once the ping and the unsupported request got their replies
        let tools = within(client.list_tools()).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");

        let (slow, fast) = within(async {
            tokio::join!(
                client.call_tool("slow", Map::new()),
                client.call_tool("fast", Map::new())
            )
        })
        .await;
        assert_eq!(slow.unwrap().text_content(), "slow");
        assert_eq!(fast.unwrap().text_content(), "fast");

        match within(client.call_tool("broken", Map::new())).await {
            Err(AgentError::Protocol(msg)) => {
                assert!(msg.contains("unknown arguments"));
                assert!(msg.contains("-32602"));
            }
            other => panic!("unexpected {other:?}"),
        }

        within(client.close()).await.unwrap();
        within(client.close()).await.unwrap();
        assert!(matches!(
            within(client.list_tools()).await,
            Err(AgentError::Connection(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejected_handshake_is_connection_error() {
        let refusing = r#"
read -r line
echo '{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"unsupported protocol version"}}'
while IFS= read -r line; do :; done
"#;
        let client = McpClient::spawn(&shell(refusing)).unwrap();
        match within(client.initialize()).await {
            Err(AgentError::Connection(msg)) => assert!(msg.contains("unsupported protocol version")),
            other => panic!("unexpected {other:?}"),
        }
        within(client.close()).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_exiting_before_handshake_is_connection_error() {
        let client = McpClient::spawn(&shell("exit 0")).unwrap();
        assert!(matches!(
            within(client.initialize()).await,
            Err(AgentError::Connection(_))
        ));
        within(client.close()).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_requests_fail_once_server_output_closes() {
        // stdout goes away but the process keeps reading stdin
        let mute = r#"
exec 1>&-
while IFS= read -r line; do :; done
"#;
        let client = McpClient::spawn(&shell(mute)).unwrap();

        assert!(matches!(
            within(client.list_tools()).await,
            Err(AgentError::Connection(_))
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(
            within(client.list_resources()).await,
            Err(AgentError::Connection(_))
        ));
        within(client.close()).await.unwrap();
    }
}

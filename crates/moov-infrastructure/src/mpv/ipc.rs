//! mpv JSON IPC client.
//!
//! Requests are single JSON lines `{"command": [...], "request_id": n}`.
//! A reader task splits incoming lines into replies (matched to the waiting
//! request by `request_id`) and events (forwarded on a channel).

use moov_core::{MoovError, Result};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

type Pending = Arc<StdMutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// A reply to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// `"success"` or mpv's error string
    pub error: String,
    pub data: Option<Value>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.error == "success"
    }
}

/// Events mpv pushes without being asked.
#[derive(Debug, Clone, PartialEq)]
pub enum MpvEvent {
    PropertyChange { name: String, data: Value },
    Seek,
    ClientMessage { args: Vec<String> },
    Shutdown,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Reply { request_id: u64, reply: Reply },
    Event(MpvEvent),
}

/// Builds one request line, newline included.
pub fn encode_request(request_id: u64, command: &[Value]) -> String {
    let mut line = json!({ "command": command, "request_id": request_id }).to_string();
    line.push('\n');
    line
}

/// Classifies one line read from the socket. Unparseable lines yield `None`.
pub fn parse_incoming(line: &str) -> Option<Incoming> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    let object = value.as_object()?;

    if let Some(event) = object.get("event").and_then(Value::as_str) {
        let event = match event {
            "property-change" => MpvEvent::PropertyChange {
                name: object.get("name")?.as_str()?.to_string(),
                data: object.get("data").cloned().unwrap_or(Value::Null),
            },
            "seek" => MpvEvent::Seek,
            "client-message" => MpvEvent::ClientMessage {
                args: object
                    .get("args")
                    .and_then(Value::as_array)
                    .map(|args| {
                        args.iter()
                            .filter_map(|a| a.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "shutdown" => MpvEvent::Shutdown,
            other => MpvEvent::Other(other.to_string()),
        };
        return Some(Incoming::Event(event));
    }

    let request_id = object.get("request_id")?.as_u64()?;
    let error = object
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("success")
        .to_string();
    let data = object.get("data").filter(|d| !d.is_null()).cloned();
    Some(Incoming::Reply {
        request_id,
        reply: Reply { error, data },
    })
}

pub struct MpvIpc {
    writer: Mutex<OwnedWriteHalf>,
    pending: Pending,
    next_id: AtomicU64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl MpvIpc {
    /// Connects to the socket at `path`; events go to `events`.
    pub async fn connect(
        path: &Path,
        timeout: Duration,
        events: mpsc::UnboundedSender<MpvEvent>,
    ) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        let (read_half, write_half) = stream.into_split();
        let pending: Pending = Arc::new(StdMutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(read_half, pending.clone(), events));

        Ok(Self {
            writer: Mutex::new(write_half),
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            reader,
        })
    }

    /// Sends a command and waits for its reply.
    pub async fn command(&self, command: Vec<Value>) -> Result<Reply> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|e| MoovError::internal(e.to_string()))?
            .insert(request_id, tx);

        let line = encode_request(request_id, &command);
        let written = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(e) = written {
            self.forget(request_id);
            return Err(MoovError::player(format!("IPC write failed: {e}")));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(MoovError::player("IPC connection closed")),
            Err(_) => {
                self.forget(request_id);
                Err(MoovError::player(format!(
                    "no IPC reply within {:?} for {}",
                    self.timeout,
                    command.first().map(Value::to_string).unwrap_or_default()
                )))
            }
        }
    }

    /// Sends a command and turns an mpv error into `MoovError::Player`.
    pub async fn command_ok(&self, command: Vec<Value>) -> Result<Option<Value>> {
        let name = command.first().map(Value::to_string).unwrap_or_default();
        let reply = self.command(command).await?;
        if reply.is_success() {
            Ok(reply.data)
        } else {
            Err(MoovError::player(format!("{name}: {}", reply.error)))
        }
    }

    pub async fn get_property(&self, name: &str) -> Result<Option<Value>> {
        self.command_ok(vec![json!("get_property"), json!(name)])
            .await
    }

    pub async fn set_property(&self, name: &str, value: Value) -> Result<()> {
        self.command_ok(vec![json!("set_property"), json!(name), value])
            .await
            .map(|_| ())
    }

    pub async fn observe_property(&self, id: u64, name: &str) -> Result<()> {
        self.command_ok(vec![json!("observe_property"), json!(id), json!(name)])
            .await
            .map(|_| ())
    }

    fn forget(&self, request_id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&request_id);
        }
    }
}

impl Drop for MpvIpc {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    read_half: OwnedReadHalf,
    pending: Pending,
    events: mpsc::UnboundedSender<MpvEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_incoming(&line) {
                Some(Incoming::Reply { request_id, reply }) => {
                    let waiter = pending.lock().ok().and_then(|mut p| p.remove(&request_id));
                    match waiter {
                        Some(tx) => {
                            let _ = tx.send(reply);
                        }
                        None => tracing::debug!(request_id, "Dropping unmatched IPC reply"),
                    }
                }
                Some(Incoming::Event(event)) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                None => tracing::debug!(line = %line, "Ignoring unparseable IPC line"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("IPC read failed: {}", e);
                break;
            }
        }
    }
    let _ = events.send(MpvEvent::Shutdown);
    // Waiters see their sender dropped and report a closed connection
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
}

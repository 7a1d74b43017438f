//! Line-based TCP link to the other participant.
//!
//! One UTF-8 line per chat message, in both directions. There is exactly
//! one peer; a dropped connection is not re-established.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use moov_application::EngineHandle;
use moov_core::conversation::{ConversationSink, InboundMessage, OutgoingMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Waits for the peer to connect on `addr`.
pub async fn listen(addr: &str) -> Result<TcpStream> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to listen on {addr}"))?;
    println!("{}", format!("Waiting for a peer on {addr}...").bright_black());
    let (stream, remote) = listener.accept().await?;
    tracing::info!(%remote, "Peer connected");
    Ok(stream)
}

pub async fn connect(addr: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to {addr}"))?;
    tracing::info!(addr, "Connected to peer");
    Ok(stream)
}

/// Chat text as one line on the wire.
pub fn encode_line(text: &str) -> String {
    let mut line = text.replace(['\r', '\n'], " ");
    line.push('\n');
    line
}

/// Sending side of the link. Lines are queued and written by a background
/// task; with no peer they go nowhere.
#[derive(Clone)]
pub struct PeerLink {
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl PeerLink {
    /// A link with no peer behind it.
    pub fn offline() -> Self {
        Self { outbound: None }
    }

    /// Takes over `stream`, returning the link and the half to read from.
    pub fn split(stream: TcpStream) -> (Self, OwnedReadHalf) {
        let (read_half, mut write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = write_half.write_all(encode_line(&text).as_bytes()).await {
                    tracing::warn!("Peer write failed: {}", e);
                    break;
                }
            }
        });

        (Self { outbound: Some(tx) }, read_half)
    }

    pub fn send_line(&self, text: &str) {
        if let Some(tx) = &self.outbound {
            if tx.send(text.to_string()).is_err() {
                tracing::debug!("Peer link closed, dropping line");
            }
        }
    }
}

/// Prints peer lines and hands them to the engine as remote messages.
pub fn spawn_reader(read_half: OwnedReadHalf, peer_nick: String, engine: EngineHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    println!("{}", format!("{peer_nick}: {line}").yellow());
                    if engine
                        .handle_message(InboundMessage::remote(peer_nick.clone(), line))
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(None) => {
                    println!("{}", format!("{peer_nick} disconnected").bright_black());
                    break;
                }
                Err(e) => {
                    tracing::warn!("Peer read failed: {}", e);
                    break;
                }
            }
        }
        tracing::info!("Peer reader stopped");
    })
}

/// Where the engine's messages go: the terminal and the peer. Sent lines
/// are never fed back to the engine.
pub struct TerminalSink {
    nick: String,
    link: PeerLink,
}

impl TerminalSink {
    pub fn new(nick: String, link: PeerLink) -> Self {
        Self { nick, link }
    }
}

#[async_trait]
impl ConversationSink for TerminalSink {
    async fn send(&self, message: OutgoingMessage) {
        println!("{}", format!("{}: {}", self.nick, message.text).bright_blue());
        self.link.send_line(&message.text);
    }
}

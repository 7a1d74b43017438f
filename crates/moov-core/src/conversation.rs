//! Conversation types: what arrives from the chat and what goes back out.

use async_trait::async_trait;

/// Where an inbound chat line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed by the local user; the host delivers it to the peer itself.
    Local,
    /// Received from the remote peer.
    Remote,
}

/// One chat line as seen by the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Display name of whoever wrote the line
    pub actor: String,
    pub text: String,
    pub origin: Origin,
}

impl InboundMessage {
    pub fn local(actor: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            text: text.into(),
            origin: Origin::Local,
        }
    }

    pub fn remote(actor: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            text: text.into(),
            origin: Origin::Remote,
        }
    }
}

/// A message this instance sends to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    /// Optional HTML rendering of `text`
    pub rich_text: Option<String>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rich_text: None,
        }
    }

    pub fn rich(text: impl Into<String>, rich_text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rich_text: Some(rich_text.into()),
        }
    }
}

/// Delivers messages to the peer of the current conversation.
///
/// Fire-and-forget: implementations log delivery failures themselves.
#[async_trait]
pub trait ConversationSink: Send + Sync {
    async fn send(&self, message: OutgoingMessage);

    /// Whether the host hands every sent message back as an
    /// [`Origin::Local`] line. Only such echoes are filtered out.
    fn echoes_sent(&self) -> bool {
        false
    }
}

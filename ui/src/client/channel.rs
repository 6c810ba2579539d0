//! Live Channel Abstraction
//!
//! A message-oriented subscription channel over a single connection. The
//! connection manager depends only on this trait; the browser implementation
//! is [`StompChannel`](super::StompChannel).

use std::rc::Rc;

/// Errors reported by a live channel
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Connection closed (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Channel is not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Lifecycle events of a connection attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The handshake completed; subscriptions may be registered
    Connected,

    /// The attempt failed or an established connection was lost
    Error(ChannelError),
}

/// Receives the lifecycle events of one connection attempt
pub type ChannelListener = Rc<dyn Fn(ChannelEvent)>;

/// Receives the body of every message delivered on a topic
pub type FrameHandler = Rc<dyn Fn(&str)>;

/// A push subscription channel
pub trait LiveChannel {
    /// Open a new connection, replacing any previous one
    ///
    /// `listener` receives the outcome of the handshake and, later, the loss
    /// of the connection. It may be invoked before `connect` returns.
    fn connect(&self, listener: ChannelListener);

    /// Register `handler` for messages published on `topic`
    fn subscribe(&self, topic: &str, handler: FrameHandler) -> Result<(), ChannelError>;

    /// Publish `body` to `destination`
    fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError>;

    /// Close the connection without reporting an event
    fn disconnect(&self);
}

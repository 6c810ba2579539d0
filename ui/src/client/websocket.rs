//! STOMP-over-WebSocket Channel
//!
//! Browser implementation of [`LiveChannel`]. Opens a raw WebSocket to the
//! SockJS endpoint of the UI backend and speaks STOMP 1.2 on it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use super::channel::{ChannelError, ChannelEvent, ChannelListener, FrameHandler, LiveChannel};
use super::stomp::{self, Frame};

/// Live channel speaking STOMP over a browser WebSocket
#[derive(Clone)]
pub struct StompChannel {
    ws_url: String,
    host: String,
    inner: Rc<RefCell<Connection>>,
}

#[derive(Default)]
struct Connection {
    ws: Option<WebSocket>,
    /// Socket callbacks; live exactly as long as `ws`
    callbacks: Option<SocketCallbacks>,
    /// Handlers keyed by subscription id
    handlers: HashMap<String, FrameHandler>,
    next_subscription: u32,
}

struct SocketCallbacks {
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(ErrorEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl StompChannel {
    /// Create a channel for `ws_url`; `host` goes into the CONNECT frame
    pub fn new(ws_url: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            host: host.into(),
            inner: Rc::new(RefCell::new(Connection::default())),
        }
    }

    fn send_frame(&self, frame: &Frame) -> Result<(), ChannelError> {
        let inner = self.inner.borrow();
        let ws = inner.ws.as_ref().ok_or(ChannelError::NotConnected)?;
        if ws.ready_state() != WebSocket::OPEN {
            return Err(ChannelError::NotConnected);
        }
        ws.send_with_str(&frame.encode())
            .map_err(|e| ChannelError::SendFailed(format!("{:?}", e)))
    }

    fn close_socket(ws: &WebSocket) {
        ws.set_onopen(None);
        ws.set_onmessage(None);
        ws.set_onerror(None);
        ws.set_onclose(None);
        let _ = ws.close();
    }
}

impl LiveChannel for StompChannel {
    fn connect(&self, listener: ChannelListener) {
        self.disconnect();

        tracing::info!("Connecting to WebSocket: {}", self.ws_url);

        let ws = match WebSocket::new(&self.ws_url) {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!("Failed to create WebSocket: {:?}", e);
                listener(ChannelEvent::Error(ChannelError::HandshakeFailed(format!("{:?}", e))));
                return;
            }
        };

        // Set up open handler - send CONNECT
        let ws_for_open = ws.clone();
        let connect_frame = Frame::connect(&self.host).encode();
        let onopen_callback = Closure::<dyn FnMut()>::new(move || {
            tracing::debug!("WebSocket open, sending CONNECT");
            if let Err(e) = ws_for_open.send_with_str(&connect_frame) {
                tracing::error!("Failed to send CONNECT: {:?}", e);
            }
        });
        ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));

        // Set up message handler
        let inner = self.inner.clone();
        let listener_for_msg = listener.clone();
        let onmessage_callback = Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
            let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() else {
                tracing::debug!("Ignoring non-text WebSocket message");
                return;
            };
            let text: String = txt.into();

            let frames = match stomp::decode(&text) {
                Ok(frames) => frames,
                Err(e) => {
                    tracing::warn!("Dropping undecodable STOMP frame: {}", e);
                    return;
                }
            };

            for frame in frames {
                match frame.command {
                    stomp::Command::Connected => {
                        tracing::debug!("Received CONNECTED (version {:?})", frame.header("version"));
                        listener_for_msg(ChannelEvent::Connected);
                    }
                    stomp::Command::Message => {
                        let handler = frame
                            .header("subscription")
                            .and_then(|id| inner.borrow().handlers.get(id).cloned());
                        match handler {
                            Some(handler) => handler(&frame.body),
                            None => tracing::debug!(
                                "No handler for message on {:?}",
                                frame.header("destination")
                            ),
                        }
                    }
                    stomp::Command::Error => {
                        let reason = frame
                            .header("message")
                            .map(str::to_string)
                            .unwrap_or_else(|| frame.body.clone());
                        tracing::error!("STOMP error: {}", reason);
                        listener_for_msg(ChannelEvent::Error(ChannelError::Protocol(reason)));
                    }
                    other => {
                        tracing::debug!("Ignoring {} frame", other);
                    }
                }
            }
        });
        ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));

        // Set up error handler; the close event that follows carries the details
        let onerror_callback = Closure::<dyn FnMut(ErrorEvent)>::new(move |e: ErrorEvent| {
            tracing::warn!("WebSocket error: {}", e.message());
        });
        ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));

        // Set up close handler
        let onclose_callback = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            tracing::info!("WebSocket closed: code={}, reason={}", e.code(), e.reason());
            listener(ChannelEvent::Error(ChannelError::Closed {
                code: e.code(),
                reason: e.reason(),
            }));
        });
        ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));

        let mut inner = self.inner.borrow_mut();
        inner.ws = Some(ws);
        inner.callbacks = Some(SocketCallbacks {
            _on_open: onopen_callback,
            _on_message: onmessage_callback,
            _on_error: onerror_callback,
            _on_close: onclose_callback,
        });
    }

    fn subscribe(&self, topic: &str, handler: FrameHandler) -> Result<(), ChannelError> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = format!("sub-{}", inner.next_subscription);
            inner.next_subscription += 1;
            inner.handlers.insert(id.clone(), handler);
            id
        };

        tracing::debug!("Subscribing to {} as {}", topic, id);
        self.send_frame(&Frame::subscribe(&id, topic))
    }

    fn send(&self, destination: &str, body: &str) -> Result<(), ChannelError> {
        self.send_frame(&Frame::send(destination, body))
    }

    fn disconnect(&self) {
        let (ws, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.handlers.clear();
            inner.next_subscription = 0;
            (inner.ws.take(), inner.callbacks.take())
        };

        if let Some(ws) = ws {
            if ws.ready_state() == WebSocket::OPEN {
                let _ = ws.send_with_str(&Frame::disconnect().encode());
            }
            Self::close_socket(&ws);
        }
        // Handlers are detached above, so the callbacks can go now
        drop(callbacks);
    }
}

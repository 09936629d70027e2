//! Realtime event channel: a websocket that reconnects forever.
//!
//! Each connection replays the subscriber's join frame before anything
//! else, so a page that was viewing a vehicle keeps receiving its events
//! across server restarts. Messages are handed to the subscriber one at a
//! time, in arrival order.

use std::rc::Rc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tracker_common::protocol::OutboundFrame;

/// Receives channel traffic.
pub trait Subscriber {
    /// Frame to send right after every (re)connect.
    fn resubscribe(&self) -> Option<OutboundFrame>;
    /// One text message from the server.
    fn on_message(&self, raw: &str);
    /// The server could not be reached. Called once per outage, not per
    /// retry.
    fn on_connect_error(&self, _error: &ChannelError) {}
}

/// Observable connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    pub connected: bool,
    /// Connection attempts so far, successful or not.
    pub attempts: u64,
    /// Connections that reached the open state.
    pub connections: u64,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("send failed: {0}")]
    Send(#[source] tungstenite::Error),
    #[error("read failed: {0}")]
    Read(#[source] tungstenite::Error),
    #[error("cannot encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed by server")]
    Closed,
}

pub struct EventChannel {
    url: String,
    delay: Duration,
    status: watch::Sender<ChannelStatus>,
}

impl EventChannel {
    pub fn new(url: impl Into<String>, delay: Duration) -> Self {
        let (status, _) = watch::channel(ChannelStatus::default());
        EventChannel {
            url: url.into(),
            delay,
            status,
        }
    }

    /// Watch the connection state.
    pub fn status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.subscribe()
    }

    /// Run until `cancel` fires. `outbound` carries frames to send while
    /// connected; frames queued while disconnected are discarded on the
    /// next connect, since the subscriber's join is replayed anyway.
    pub async fn run<S: Subscriber>(
        self,
        subscriber: Rc<S>,
        mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
        cancel: CancellationToken,
    ) {
        let mut unreachable = false;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.status.send_modify(|s| s.attempts += 1);

            match self.connect_once(&*subscriber, &mut outbound, &cancel).await {
                Err(e @ ChannelError::Connect(_)) => {
                    warn!("WS {}: {e}", self.url);
                    if !unreachable {
                        subscriber.on_connect_error(&e);
                    }
                    unreachable = true;
                }
                Err(e) => {
                    warn!("WS {}: {e}", self.url);
                    unreachable = false;
                }
                Ok(()) => unreachable = false,
            }
            self.status.send_modify(|s| s.connected = false);

            if cancel.is_cancelled() {
                break;
            }
            warn!("WS closed; retrying in {}ms", self.delay.as_millis());
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = cancel.cancelled() => break,
            }
        }
        info!("Event channel stopped");
    }

    async fn connect_once<S: Subscriber>(
        &self,
        subscriber: &S,
        outbound: &mut mpsc::UnboundedReceiver<OutboundFrame>,
        cancel: &CancellationToken,
    ) -> Result<(), ChannelError> {
        let (ws, _) = tokio::select! {
            res = tokio_tungstenite::connect_async(self.url.as_str()) => {
                res.map_err(ChannelError::Connect)?
            }
            _ = cancel.cancelled() => return Ok(()),
        };
        info!("WS connected to {}", self.url);
        self.status.send_modify(|s| {
            s.connected = true;
            s.connections += 1;
        });

        let (mut write, mut read) = ws.split();

        while outbound.try_recv().is_ok() {}
        if let Some(frame) = subscriber.resubscribe() {
            send(&mut write, &frame).await?;
            debug!("Replayed subscription: {frame:?}");
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    write.close().await.ok();
                    return Ok(());
                }
                Some(frame) = outbound.recv() => {
                    send(&mut write, &frame).await?;
                }
                msg = read.next() => match msg {
                    None => return Err(ChannelError::Closed),
                    Some(Err(e)) => return Err(ChannelError::Read(e)),
                    Some(Ok(Message::Text(text))) => subscriber.on_message(text.as_str()),
                    Some(Ok(Message::Close(frame))) => {
                        debug!("Close frame: {frame:?}");
                        return Err(ChannelError::Closed);
                    }
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

async fn send<W>(write: &mut W, frame: &OutboundFrame) -> Result<(), ChannelError>
where
    W: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = frame.to_json()?;
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(ChannelError::Send)
}

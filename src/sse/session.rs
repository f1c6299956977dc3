//! A single event-stream response.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::EdgeError;

/// Comment frame used to keep idle connections open.
pub const HEARTBEAT_FRAME: &str = ":heartbeat\n\n";

/// Render one event frame.
///
/// Multi-line payloads become one `data:` line per line. Line breaks in the
/// event name or id would split the frame, so they are dropped.
pub fn format_event(event: &str, data: &str, id: Option<&str>) -> String {
    let mut frame = String::with_capacity(event.len() + data.len() + 32);
    if let Some(id) = id {
        frame.push_str("id: ");
        frame.push_str(&single_line(id));
        frame.push('\n');
    }
    frame.push_str("event: ");
    frame.push_str(&single_line(event));
    frame.push('\n');
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line.strip_suffix('\r').unwrap_or(line));
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

fn single_line(value: &str) -> String {
    value.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Handle for pushing events to one connected client.
#[derive(Debug)]
pub struct SseSession {
    id: Uuid,
    tx: Option<mpsc::Sender<Bytes>>,
}

impl SseSession {
    /// Open a session. The returned response carries the event-stream
    /// headers and must be returned from the handler as-is.
    pub fn open(capacity: usize) -> (Self, Response) {
        let (tx, rx) = mpsc::channel::<Bytes>(capacity.max(1));
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|frame| (Ok::<_, Infallible>(frame), rx))
        });

        let mut response = Response::new(Body::from_stream(stream));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let session = Self {
            id: Uuid::new_v4(),
            tx: Some(tx),
        };
        tracing::debug!(session_id = %session.id, "SSE session opened");
        (session, response)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue an event frame.
    pub async fn send(&self, event: &str, data: &str, id: Option<&str>) -> Result<(), EdgeError> {
        self.push(format_event(event, data, id)).await
    }

    /// Queue an event whose data is `data` serialized as JSON.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        event: &str,
        data: &T,
        id: Option<&str>,
    ) -> Result<(), EdgeError> {
        let payload = serde_json::to_string(data)?;
        self.send(event, &payload, id).await
    }

    /// Queue a `:heartbeat` comment frame.
    pub async fn heartbeat(&self) -> Result<(), EdgeError> {
        self.push(HEARTBEAT_FRAME.to_string()).await
    }

    async fn push(&self, frame: String) -> Result<(), EdgeError> {
        let tx = self.tx.as_ref().ok_or(EdgeError::StreamClosed)?;
        tx.send(Bytes::from(frame)).await.map_err(|_| {
            tracing::debug!(session_id = %self.id, "SSE peer disconnected");
            EdgeError::StreamClosed
        })
    }

    /// End the stream. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            tracing::debug!(session_id = %self.id, "SSE session closed");
        }
    }

    /// Whether the session was closed or the peer went away.
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }

    /// Resolves once the peer disconnects (immediately if already closed).
    pub async fn closed(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }

    /// Send a heartbeat every `interval` until the session ends.
    pub fn spawn_keepalive(&self, interval: Duration) -> Option<JoinHandle<()>> {
        let weak = self.tx.as_ref()?.downgrade();
        let id = self.id;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(tx) = weak.upgrade() else { break };
                // A full buffer already proves the stream is busy; skip the beat.
                match tx.try_send(Bytes::from_static(HEARTBEAT_FRAME.as_bytes())) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
            tracing::trace!(session_id = %id, "SSE keep-alive stopped");
        }))
    }
}

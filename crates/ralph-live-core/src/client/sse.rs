//! Server-Sent Events transport for the live log stream.
//!
//! `GET /api/sessions/{id}/events` delivers one JSON log frame per `data:`
//! payload. Retries are disabled here because the connection manager owns
//! the reconnect policy and the resume cursor.

use super::{ApiClient, FrameStream, LogTransport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use reqwest_eventsource::{retry::Never, Event, EventSource};
use tracing::debug;

#[async_trait]
impl LogTransport for ApiClient {
    async fn open(
        &self,
        orchestrator_id: &str,
        last_event_id: Option<&str>,
    ) -> Result<FrameStream> {
        let path = format!("/api/sessions/{}/events", orchestrator_id);
        let mut req = self.request(reqwest::Method::GET, &path);
        if let Some(id) = last_event_id {
            req = req.header("Last-Event-ID", id);
        }

        let mut source = EventSource::new(req)
            .map_err(|e| Error::Stream(format!("Cannot build event stream request: {}", e)))?;
        source.set_retry_policy(Box::new(Never));

        // The Open event is the handshake. A message arriving first is kept.
        let first = match source.next().await {
            Some(Ok(Event::Open)) => None,
            Some(Ok(Event::Message(msg))) => Some(msg.data),
            Some(Err(e)) => {
                source.close();
                return Err(map_error(e, &path));
            }
            None => return Err(Error::StreamClosed),
        };
        debug!(orchestrator_id = %orchestrator_id, resume_after = ?last_event_id, "Event stream opened");

        let frames = source.filter_map(move |event| {
            future::ready(match event {
                Ok(Event::Open) => None,
                Ok(Event::Message(msg)) => Some(Ok(msg.data)),
                Err(e) => Some(Err(map_error(e, ""))),
            })
        });

        Ok(Box::pin(stream::iter(first.map(Ok)).chain(frames)))
    }
}

fn map_error(e: reqwest_eventsource::Error, path: &str) -> Error {
    match e {
        reqwest_eventsource::Error::StreamEnded => Error::StreamClosed,
        reqwest_eventsource::Error::InvalidStatusCode(status, _)
            if status == reqwest::StatusCode::NOT_FOUND =>
        {
            Error::NotFound(path.to_string())
        }
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
            Error::api(status.as_u16(), "event stream rejected")
        }
        other => Error::Stream(other.to_string()),
    }
}

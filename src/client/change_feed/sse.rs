//! Server-sent-events change feed.
//!
//! Connects to the storage server's realtime endpoint:
//!
//! ```http
//! GET /api/realtime?collections=members,photos HTTP/1.1
//! Subscribe: true
//! ```
//!
//! and reads `data: {ChangeEvent json}` lines. The first connection is made
//! inside `subscribe` so a refused subscription is reported to the caller.
//! After that the feed task owns the connection: a dropped stream is
//! re-opened with capped exponential backoff, and every subscribed collection
//! is reported as changed after a reconnect because events may have been
//! missed in between.

use super::{ChangeCallback, ChangeFeed, SubscriptionHandle, SubscriptionRegistry};
use crate::client::error::SubscriptionError;
use crate::shared::event::ChangeEvent;
use crate::shared::models::Collection;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SseChangeFeed {
    client: Client,
    url: String,
    registry: SubscriptionRegistry,
    initial_reconnect_delay: Duration,
}

impl SseChangeFeed {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            registry: SubscriptionRegistry::new(),
            initial_reconnect_delay: INITIAL_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.initial_reconnect_delay = delay;
        self
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

async fn open(
    client: &Client,
    url: &str,
    collections: &[Collection],
) -> Result<reqwest::Response, SubscriptionError> {
    let filter = collections
        .iter()
        .map(Collection::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let response = client
        .get(url)
        .header("Subscribe", "true")
        .header("Accept", "text/event-stream")
        .query(&[("collections", filter)])
        .send()
        .await
        .map_err(|e| SubscriptionError::Connect(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SubscriptionError::Rejected {
            status: response.status().as_u16(),
        });
    }
    Ok(response)
}

/// Read events until the stream ends or errors
async fn pump(response: reqwest::Response, collections: &[Collection], on_change: &ChangeCallback) {
    let mut stream = response.bytes_stream();
    let mut buffer = EventBuffer::default();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for event in buffer.push(&bytes) {
                    if collections.contains(&event.collection) {
                        tracing::debug!("[Feed] {:?} on {}", event.kind, event.collection);
                        on_change(event.collection);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("[Feed] Error reading event stream: {}", e);
                return;
            }
        }
    }
    tracing::warn!("[Feed] Event stream closed by server");
}

#[async_trait]
impl ChangeFeed for SseChangeFeed {
    fn name(&self) -> &'static str {
        "sse"
    }

    async fn subscribe(
        &self,
        collections: &[Collection],
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        let claim = self.registry.claim(collections)?;
        let set = claim.collections().to_vec();
        let mut response = open(&self.client, &self.url, &set).await?;

        tracing::info!("[Feed] Event stream established at {} for {:?}", self.url, set);

        let client = self.client.clone();
        let url = self.url.clone();
        let initial_delay = self.initial_reconnect_delay;

        let task = tokio::spawn(async move {
            loop {
                pump(response, &set, &on_change).await;

                let mut delay = initial_delay;
                response = loop {
                    tokio::time::sleep(delay).await;
                    match open(&client, &url, &set).await {
                        Ok(response) => break response,
                        Err(e) => {
                            delay = std::cmp::min(delay * 2, MAX_RECONNECT_DELAY);
                            tracing::warn!(
                                "[Feed] Reconnect failed, next attempt in {:?}: {}",
                                delay,
                                e
                            );
                        }
                    }
                };

                tracing::info!("[Feed] Event stream re-established, refreshing {:?}", set);
                for collection in &set {
                    on_change(*collection);
                }
            }
        });

        Ok(SubscriptionHandle::new(claim, task))
    }
}

/// Splits a byte stream into SSE lines and decodes `data:` payloads
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: Vec<u8>,
}

impl EventBuffer {
    /// Feed a chunk, returning every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ChangeEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(&['\n', '\r'][..]);

            // Blank separators, comments and keep-alives
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                match serde_json::from_str::<ChangeEvent>(data.trim_start()) {
                    Ok(event) => events.push(event),
                    Err(e) => tracing::warn!("[Feed] Ignoring malformed event '{}': {}", data, e),
                }
            }
        }
        events
    }
}

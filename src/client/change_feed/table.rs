//! Change feed over the remote table store's realtime websocket.
//!
//! The store speaks the Phoenix channel protocol at
//! `/realtime/v1/websocket`. Every subscribed collection joins its own topic
//! with a `postgres_changes` filter of `{event: "*", schema: "public", table}`
//! and any change frame on that topic reports the collection. Join replies
//! are awaited inside `subscribe`, so a refused join reaches the caller.
//!
//! The feed task sends a heartbeat to keep the socket open. A dropped socket
//! is re-opened with capped exponential backoff, then every subscribed
//! collection is reported as changed.

use super::{ChangeCallback, ChangeFeed, SubscriptionHandle, SubscriptionRegistry};
use crate::client::error::SubscriptionError;
use crate::shared::config::{ConfigError, RemoteConfig};
use crate::shared::models::Collection;
use async_trait::async_trait;
use futures_util::{Sink, SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// One frame of the channel protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl ChannelMessage {
    pub fn join(topic: &str, table: &str, access_token: Option<&str>, reference: u64) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{ "event": "*", "schema": "public", "table": table }]
            }
        });
        if let Some(token) = access_token {
            payload["access_token"] = Value::String(token.to_string());
        }
        Self {
            topic: topic.to_string(),
            event: "phx_join".to_string(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// `status` of a `phx_reply`, `None` for every other event
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != "phx_reply" {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }
}

/// What a received frame means for the subscribed topics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Changed(Collection),
    /// The server dropped one of our channels
    Lost(String),
    Ignored,
}

pub fn classify(message: &ChannelMessage, topics: &HashMap<String, Collection>) -> Frame {
    let Some(collection) = topics.get(&message.topic).copied() else {
        return Frame::Ignored;
    };
    match message.event.as_str() {
        "postgres_changes" | "INSERT" | "UPDATE" | "DELETE" => Frame::Changed(collection),
        "phx_error" | "phx_close" => Frame::Lost(format!("{} on {}", message.event, message.topic)),
        _ => Frame::Ignored,
    }
}

/// Websocket endpoint for a project URL: `https` becomes `wss` and the API
/// key travels as the `apikey` query parameter
pub fn socket_url(config: &RemoteConfig) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl(config.url.clone());
    let mut url = Url::parse(&config.url).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => return Err(invalid()),
    };
    url.set_scheme(scheme).map_err(|_| invalid())?;

    let path = format!("{}/realtime/v1/websocket", url.path().trim_end_matches('/'));
    url.set_path(&path);
    {
        let mut query = url.query_pairs_mut();
        if let Some(key) = &config.api_key {
            query.append_pair("apikey", key);
        }
        query.append_pair("vsn", "1.0.0");
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct TableChangeFeed {
    url: Url,
    api_key: Option<String>,
    members_table: String,
    photos_table: String,
    registry: SubscriptionRegistry,
    initial_reconnect_delay: Duration,
    heartbeat_interval: Duration,
}

impl TableChangeFeed {
    pub fn new(config: &RemoteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: socket_url(config)?,
            api_key: config.api_key.clone(),
            members_table: config.members_table.clone(),
            photos_table: config.photos_table.clone(),
            registry: SubscriptionRegistry::new(),
            initial_reconnect_delay: INITIAL_RECONNECT_DELAY,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.initial_reconnect_delay = delay;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn table(&self, collection: Collection) -> &str {
        match collection {
            Collection::Members => &self.members_table,
            Collection::Photos => &self.photos_table,
        }
    }

    /// Connect and join one topic per collection, waiting for every reply
    async fn open(
        &self,
        set: &[Collection],
    ) -> Result<(Socket, HashMap<String, Collection>), SubscriptionError> {
        let mut socket = match timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str())).await {
            Ok(Ok((socket, _))) => socket,
            Ok(Err(tungstenite::Error::Http(response))) => {
                return Err(SubscriptionError::Rejected {
                    status: response.status().as_u16(),
                })
            }
            Ok(Err(e)) => return Err(SubscriptionError::Connect(e.to_string())),
            Err(_) => return Err(SubscriptionError::Connect("connection timed out".to_string())),
        };

        let mut topics = HashMap::new();
        let mut waiting = HashMap::new();
        for (reference, collection) in (1u64..).zip(set) {
            let table = self.table(*collection);
            let topic = format!("realtime:{}", table);
            let join = ChannelMessage::join(&topic, table, self.api_key.as_deref(), reference);
            send(&mut socket, &join).await?;
            topics.insert(topic.clone(), *collection);
            waiting.insert(reference.to_string(), topic);
        }

        let joined = timeout(CONNECT_TIMEOUT, async {
            while !waiting.is_empty() {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(message) = serde_json::from_str::<ChannelMessage>(&text) else {
                            continue;
                        };
                        let Some(status) = message.reply_status() else {
                            continue;
                        };
                        let topic = message.reference.as_ref().and_then(|r| waiting.remove(r));
                        let Some(topic) = topic else {
                            continue;
                        };
                        if status != "ok" {
                            return Err(SubscriptionError::Connect(format!(
                                "join of {} refused: {}",
                                topic, message.payload
                            )));
                        }
                        tracing::debug!("[Feed] Joined {}", topic);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let reason = "socket closed while joining".to_string();
                        return Err(SubscriptionError::Connect(reason));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(SubscriptionError::Connect(e.to_string())),
                }
            }
            Ok(())
        })
        .await;

        match joined {
            Ok(Ok(())) => Ok((socket, topics)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SubscriptionError::Connect(
                "timed out waiting for join reply".to_string(),
            )),
        }
    }
}

async fn send<S>(sink: &mut S, message: &ChannelMessage) -> Result<(), SubscriptionError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text =
        serde_json::to_string(message).map_err(|e| SubscriptionError::Connect(e.to_string()))?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| SubscriptionError::Connect(e.to_string()))
}

/// Read frames and keep the socket alive until it drops
async fn pump(
    socket: Socket,
    topics: &HashMap<String, Collection>,
    heartbeat: Duration,
    on_change: &ChangeCallback,
) {
    let (mut write, mut read) = socket.split();
    let mut ticker = tokio::time::interval(heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut reference = topics.len() as u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                reference += 1;
                if let Err(e) = send(&mut write, &ChannelMessage::heartbeat(reference)).await {
                    tracing::warn!("[Feed] Heartbeat failed: {}", e);
                    return;
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let message = match serde_json::from_str::<ChannelMessage>(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::debug!("[Feed] Ignoring malformed frame: {}", e);
                            continue;
                        }
                    };
                    match classify(&message, topics) {
                        Frame::Changed(collection) => {
                            tracing::debug!("[Feed] {} changed on {}", collection, message.topic);
                            on_change(collection);
                        }
                        Frame::Lost(reason) => {
                            tracing::warn!("[Feed] Channel lost: {}", reason);
                            return;
                        }
                        Frame::Ignored => {}
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::warn!("[Feed] Realtime socket closed by server");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Feed] Error reading realtime socket: {}", e);
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl ChangeFeed for TableChangeFeed {
    fn name(&self) -> &'static str {
        "remote-table"
    }

    async fn subscribe(
        &self,
        collections: &[Collection],
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        let claim = self.registry.claim(collections)?;
        let set = claim.collections().to_vec();
        let (mut socket, mut topics) = self.open(&set).await?;

        tracing::info!("[Feed] Realtime channels joined for {:?}", set);

        let feed = self.clone();
        let task = tokio::spawn(async move {
            loop {
                pump(socket, &topics, feed.heartbeat_interval, &on_change).await;

                let mut delay = feed.initial_reconnect_delay;
                (socket, topics) = loop {
                    tokio::time::sleep(delay).await;
                    match feed.open(&set).await {
                        Ok(opened) => break opened,
                        Err(e) => {
                            delay = std::cmp::min(delay * 2, MAX_RECONNECT_DELAY);
                            tracing::warn!(
                                "[Feed] Rejoin failed, next attempt in {:?}: {}",
                                delay,
                                e
                            );
                        }
                    }
                };

                tracing::info!("[Feed] Realtime channels rejoined, refreshing {:?}", set);
                for collection in &set {
                    on_change(*collection);
                }
            }
        });

        Ok(SubscriptionHandle::new(claim, task))
    }
}

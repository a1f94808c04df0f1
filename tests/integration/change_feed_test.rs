//! Change feed tests: the server-sent-events feed against a mock server, the
//! realtime websocket feed against a small channel server and the in-process
//! broadcast feed.

use assert_matches::assert_matches;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use showcase_sync::client::{
    BroadcastChangeFeed, ChangeCallback, ChangeFeed, SseChangeFeed, SubscriptionError,
    TableChangeFeed,
};
use showcase_sync::shared::{ChangeEvent, ChangeKind, Collection, RemoteConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn recorder() -> (ChangeCallback, mpsc::UnboundedReceiver<Collection>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: ChangeCallback = Arc::new(move |collection: Collection| {
        let _ = tx.send(collection);
    });
    (callback, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Collection>) -> Collection {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("change notification")
        .expect("feed still open")
}

fn sse_body(events: &[ChangeEvent]) -> String {
    events
        .iter()
        .map(|event| {
            format!(
                "event: change\ndata: {}\n\n",
                serde_json::to_string(event).unwrap()
            )
        })
        .collect()
}

#[tokio::test]
async fn test_sse_feed_delivers_events_for_subscribed_collections() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        ChangeEvent::new(Collection::Photos, ChangeKind::Insert).with_record("p9"),
        ChangeEvent::new(Collection::Members, ChangeKind::Delete),
    ]);
    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .and(header("Subscribe", "true"))
        .and(query_param("collections", "photos"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let feed = SseChangeFeed::new(reqwest::Client::new(), format!("{}/api/realtime", server.uri()))
        .with_reconnect_delay(Duration::from_millis(20));
    let (callback, mut rx) = recorder();

    let handle = feed.subscribe(&[Collection::Photos], callback).await.unwrap();
    assert_eq!(handle.collections(), &[Collection::Photos]);

    // The members event is filtered out; the second notification comes from
    // the reconnect after the mock closes the stream
    assert_eq!(next(&mut rx).await, Collection::Photos);
    assert_eq!(next(&mut rx).await, Collection::Photos);

    handle.unsubscribe();
    assert_eq!(feed.registry().active_count(), 0);
}

#[tokio::test]
async fn test_sse_feed_rejected_subscription() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let feed = SseChangeFeed::new(reqwest::Client::new(), format!("{}/api/realtime", server.uri()));
    let (callback, _rx) = recorder();

    let result = feed.subscribe(&Collection::ALL, callback).await;
    assert_matches!(result, Err(SubscriptionError::Rejected { status: 400 }));
    // A failed subscribe does not keep the set reserved
    assert_eq!(feed.registry().active_count(), 0);
}

#[tokio::test]
async fn test_sse_feed_unreachable_server() {
    let feed = SseChangeFeed::new(reqwest::Client::new(), "http://127.0.0.1:1/api/realtime");
    let (callback, _rx) = recorder();

    let result = feed.subscribe(&[Collection::Members], callback).await;
    assert_matches!(result, Err(SubscriptionError::Connect(_)));
}

#[tokio::test]
async fn test_sse_feed_rejects_duplicate_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/realtime"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(": connected\n\n"),
        )
        .mount(&server)
        .await;

    let feed = SseChangeFeed::new(reqwest::Client::new(), format!("{}/api/realtime", server.uri()))
        .with_reconnect_delay(Duration::from_secs(60));
    let (first_cb, _first_rx) = recorder();
    let (second_cb, _second_rx) = recorder();

    let handle = feed
        .subscribe(&[Collection::Members, Collection::Photos], first_cb)
        .await
        .unwrap();
    let duplicate = feed
        .subscribe(&[Collection::Photos, Collection::Members], second_cb)
        .await;
    assert_matches!(
        duplicate,
        Err(SubscriptionError::AlreadySubscribed(key)) if key == "members,photos"
    );

    drop(handle);
    assert!(!feed.registry().is_subscribed(&Collection::ALL));
}

#[tokio::test]
async fn test_broadcast_feed_filters_and_stops_on_unsubscribe() {
    let (sender, _) = broadcast::channel(16);
    let feed = BroadcastChangeFeed::new(sender);
    let (callback, mut rx) = recorder();

    let handle = feed.subscribe(&[Collection::Members], callback).await.unwrap();
    assert!(handle.is_active());

    feed.publish(ChangeEvent::bulk(Collection::Photos));
    feed.publish(ChangeEvent::new(Collection::Members, ChangeKind::Update).with_record("m1"));
    assert_eq!(next(&mut rx).await, Collection::Members);

    handle.unsubscribe();
    feed.publish(ChangeEvent::bulk(Collection::Members));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_empty_collection_set_is_refused() {
    let (sender, _) = broadcast::channel(16);
    let feed = BroadcastChangeFeed::new(sender);
    let (callback, _rx) = recorder();

    let result = feed.subscribe(&[], callback).await;
    assert_matches!(result, Err(SubscriptionError::Connect(_)));
}

/// Channel server answering every join with `status`. The first connection
/// pushes a gallery change once both tables are joined, then hangs up.
async fn realtime_server(status: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let connection = counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let mut joined = 0;
                while let Some(Ok(frame)) = socket.next().await {
                    let Message::Text(text) = frame else { continue };
                    let message: Value = serde_json::from_str(&text).unwrap();
                    if message["event"] != "phx_join" {
                        continue;
                    }
                    let reply = json!({
                        "topic": message["topic"],
                        "event": "phx_reply",
                        "payload": { "status": status, "response": {} },
                        "ref": message["ref"]
                    });
                    if socket.send(Message::Text(reply.to_string())).await.is_err() {
                        return;
                    }
                    joined += 1;
                    if joined == 2 && connection == 0 && status == "ok" {
                        let change = json!({
                            "topic": "realtime:gallery",
                            "event": "postgres_changes",
                            "payload": { "data": { "type": "INSERT", "table": "gallery" } },
                            "ref": null
                        });
                        let _ = socket.send(Message::Text(change.to_string())).await;
                        let _ = socket.close(None).await;
                        return;
                    }
                }
            });
        }
    });

    (url, connections)
}

fn table_feed(url: &str) -> TableChangeFeed {
    let config = RemoteConfig {
        api_key: Some("anon-key".to_string()),
        photos_table: "gallery".to_string(),
        ..RemoteConfig::new(url)
    };
    TableChangeFeed::new(&config)
        .unwrap()
        .with_reconnect_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn test_table_feed_reports_changes_and_rejoins() {
    let (url, connections) = realtime_server("ok").await;
    let feed = table_feed(&url);
    let (callback, mut rx) = recorder();

    let handle = feed
        .subscribe(&[Collection::Members, Collection::Photos], callback)
        .await
        .unwrap();
    assert!(feed.registry().is_subscribed(&[Collection::Photos, Collection::Members]));

    // The pushed change names only the gallery table
    assert_eq!(next(&mut rx).await, Collection::Photos);

    // The server hung up; after rejoining every collection is reported
    let mut after_rejoin = vec![next(&mut rx).await, next(&mut rx).await];
    after_rejoin.sort();
    assert_eq!(after_rejoin, vec![Collection::Members, Collection::Photos]);
    assert_eq!(connections.load(Ordering::SeqCst), 2);

    handle.unsubscribe();
    assert_eq!(feed.registry().active_count(), 0);
}

#[tokio::test]
async fn test_table_feed_refused_join_releases_claim() {
    let (url, _connections) = realtime_server("error").await;
    let feed = table_feed(&url);
    let (callback, _rx) = recorder();

    let result = feed.subscribe(&[Collection::Members], callback).await;

    assert_matches!(
        result,
        Err(SubscriptionError::Connect(message)) if message.contains("refused")
    );
    assert_eq!(feed.registry().active_count(), 0);
}

#[tokio::test]
async fn test_table_feed_unreachable_store() {
    let feed = table_feed("http://127.0.0.1:9");
    let (callback, _rx) = recorder();

    let result = feed.subscribe(&[Collection::Members], callback).await;
    assert_matches!(result, Err(SubscriptionError::Connect(_)));
}

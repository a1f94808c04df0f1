//! Transport adapter tests against a mock HTTP server

use crate::common::{member, photo, seeded_snapshot};
use showcase_sync::client::{
    CatalogClient, LocalProxyTransport, MediaUploader, Operation, RemoteTableTransport, Transport,
    TransportCause,
};
use showcase_sync::shared::{Collection, Mutation, Record, Records, RemoteConfig, Snapshot};
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn proxy(server: &MockServer) -> LocalProxyTransport {
    LocalProxyTransport::new(reqwest::Client::new(), &format!("{}/api/data", server.uri()))
}

fn saved(success: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": success }))
}

fn remote_config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        api_key: Some("anon-key".to_string()),
        photos_table: "gallery".to_string(),
        photos_order_column: "created_at".to_string(),
        ..RemoteConfig::new(server.uri())
    }
}

#[tokio::test]
async fn test_local_proxy_fetch_extracts_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seeded_snapshot()))
        .mount(&server)
        .await;

    let transport = proxy(&server);
    let records = transport.fetch_all(Collection::Photos).await.unwrap();

    assert_eq!(records, Records::Photos(seeded_snapshot().photos));
}

#[tokio::test]
async fn test_local_proxy_insert_posts_full_snapshot() {
    let server = MockServer::start().await;
    let stored = Snapshot {
        members: vec![member("m1", "Ada")],
        photos: vec![photo("p1", "Harbour", 1)],
    };
    let mut expected = stored.clone();
    expected.members.push(member("m2", "Grace"));

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data"))
        .and(body_json(&expected))
        .respond_with(saved(true))
        .expect(1)
        .mount(&server)
        .await;

    let transport = proxy(&server);
    transport
        .insert(Record::Member(member("m2", "Grace")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_local_proxy_delete_posts_snapshot_without_row() {
    let server = MockServer::start().await;
    let stored = seeded_snapshot();
    let mut expected = stored.clone();
    expected.photos.retain(|p| p.id != "p2");

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data"))
        .and(body_json(&expected))
        .respond_with(saved(true))
        .expect(1)
        .mount(&server)
        .await;

    let transport = proxy(&server);
    transport
        .apply(&Mutation::Delete {
            collection: Collection::Photos,
            id: "p2".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_local_proxy_reports_unsuccessful_save() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Snapshot::default()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data"))
        .respond_with(saved(false))
        .mount(&server)
        .await;

    let transport = proxy(&server);
    let err = transport
        .insert(Record::Photo(photo("p1", "Harbour", 1)))
        .await
        .unwrap_err();

    assert_eq!(err.collection, Collection::Photos);
    assert_eq!(err.operation, Operation::Insert);
    assert!(matches!(err.cause, TransportCause::Rejected(_)));
}

#[tokio::test]
async fn test_local_proxy_surfaces_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let transport = proxy(&server);
    let err = transport.fetch_all(Collection::Members).await.unwrap_err();

    assert_eq!(
        err.cause,
        TransportCause::Status {
            status: 500,
            body: "disk full".to_string()
        }
    );
}

#[tokio::test]
async fn test_local_proxy_unreachable_is_network_error() {
    let transport = LocalProxyTransport::new(reqwest::Client::new(), "http://127.0.0.1:1/api/data");
    let err = transport.fetch_all(Collection::Members).await.unwrap_err();
    assert!(matches!(err.cause, TransportCause::Network(_)));
}

#[tokio::test]
async fn test_remote_fetch_orders_and_authorizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/gallery"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "p2",
                "title": "Skyline",
                "image_url": "https://cdn.example.com/p2.jpg",
                "created_at": "2024-03-02T12:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    let records = transport.fetch_all(Collection::Photos).await.unwrap();

    match records {
        Records::Photos(photos) => {
            assert_eq!(photos.len(), 1);
            assert_eq!(photos[0].url, "https://cdn.example.com/p2.jpg");
        }
        other => panic!("expected photos, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_members_ordered_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/members"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![member("m1", "Ada")]))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    let records = transport.fetch_all(Collection::Members).await.unwrap();
    assert_eq!(records, Records::Members(vec![member("m1", "Ada")]));
}

#[tokio::test]
async fn test_remote_insert_posts_single_row() {
    let server = MockServer::start().await;
    let sunrise = photo("p7", "Sunrise", 9);
    Mock::given(method("POST"))
        .and(path("/rest/v1/gallery"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(serde_json::json!([sunrise])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    transport.insert(Record::Photo(sunrise)).await.unwrap();
}

#[tokio::test]
async fn test_remote_update_and_delete_filter_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/members"))
        .and(query_param("id", "eq.m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/members"))
        .and(query_param("id", "eq.m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    transport
        .update(Record::Member(member("m1", "Ada L.")))
        .await
        .unwrap();
    transport.remove(Collection::Members, "m1").await.unwrap();
}

#[tokio::test]
async fn test_remote_rejection_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/gallery"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    let err = transport.remove(Collection::Photos, "p1").await.unwrap_err();
    assert_eq!(err.operation, Operation::Remove);
    assert!(matches!(err.cause, TransportCause::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_media_upload_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/media/gallery/[0-9a-f-]+\.png$"))
        .and(header("Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = RemoteTableTransport::new(reqwest::Client::new(), remote_config(&server));
    let url = transport
        .upload(Collection::Photos, "Sunrise.PNG", "image/png", vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();

    let prefix = format!("{}/storage/v1/object/public/media/gallery/", server.uri());
    assert!(url.starts_with(&prefix), "unexpected url {}", url);
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn test_catalog_gallery_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/gallery"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [photo("p1", "Harbour", 1)],
            "totalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = CatalogClient::new(reqwest::Client::new(), format!("{}/", server.uri()));
    let page = catalog.fetch_gallery_page(2, 1).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_count, 3);
    assert!(page.has_more);
}

#[tokio::test]
async fn test_catalog_members() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seeded_snapshot().members))
        .mount(&server)
        .await;

    let catalog = CatalogClient::new(reqwest::Client::new(), server.uri());
    let members = catalog.fetch_members().await.unwrap();
    assert_eq!(members, seeded_snapshot().members);
}

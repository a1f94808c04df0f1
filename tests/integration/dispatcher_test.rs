//! Action dispatcher tests
//!
//! `dispatch` must apply writes before it returns, never block on the
//! network and turn invalid input into error records.

use crate::common::{eventually, member, photo, quiet_config, seeded_snapshot, MockTransport};
use showcase_sync::client::{Action, RemoteTableTransport, SyncEngine};
use showcase_sync::shared::{Collection, Member, Photo, RemoteConfig, Snapshot};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

async fn ready_engine(initial: Snapshot) -> (SyncEngine, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new(initial));
    let engine = SyncEngine::new(quiet_config(), transport.clone(), None);
    engine.init().await.unwrap();
    (engine, transport)
}

#[tokio::test]
async fn test_update_member_replaces_in_place() {
    let (engine, transport) = ready_engine(seeded_snapshot()).await;

    let grace = member("m2", "Grace").with_skill("cobol");
    engine.dispatch(Action::UpdateMember(grace.clone()));

    let members = engine.members();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1], grace);

    eventually(WAIT, "update stored", || {
        transport.store().snapshot().members.contains(&grace)
    })
    .await;
}

#[tokio::test]
async fn test_update_of_unknown_member_leaves_cache_alone() {
    let (engine, _transport) = ready_engine(seeded_snapshot()).await;
    let before = engine.members();

    engine.dispatch(Action::UpdateMember(member("ghost", "Nobody")));

    assert_eq!(engine.members(), before);
}

#[tokio::test]
async fn test_delete_of_missing_id_is_a_noop() {
    let (engine, _transport) = ready_engine(seeded_snapshot()).await;

    engine.dispatch(Action::DeletePhoto("missing".to_string()));

    assert_eq!(engine.photos().len(), 2);
}

#[tokio::test]
async fn test_blank_delete_id_is_recorded() {
    let (engine, transport) = ready_engine(seeded_snapshot()).await;

    engine.dispatch(Action::DeleteMember("   ".to_string()));

    assert_eq!(engine.members().len(), 2);
    assert_eq!(engine.status().pending_writes, 0);
    let errors = engine.take_errors();
    assert_eq!(errors.len(), 1);
    assert_contains!(errors[0].message, "id");
    assert_eq!(transport.write_count(), 0);
}

#[tokio::test]
async fn test_photo_without_url_is_rejected() {
    let (engine, _transport) = ready_engine(Snapshot::default()).await;

    let mut broken = photo("p9", "Broken", 3);
    broken.url = String::new();
    engine.dispatch(Action::AddPhoto(broken));

    assert!(engine.photos().is_empty());
    let errors = engine.take_errors();
    assert_eq!(errors[0].collection, Some(Collection::Photos));
    assert_contains!(errors[0].message, "url");
}

#[tokio::test]
async fn test_refresh_action_fetches_requested_collection() {
    let (engine, transport) = ready_engine(seeded_snapshot()).await;

    engine.dispatch(Action::Refresh(Some(Collection::Photos)));
    eventually(WAIT, "photos refetch", || transport.fetch_count(Collection::Photos) == 2).await;
    assert_eq!(transport.fetch_count(Collection::Members), 1);

    engine.dispatch(Action::Refresh(None));
    eventually(WAIT, "full refetch", || {
        transport.fetch_count(Collection::Photos) == 3
            && transport.fetch_count(Collection::Members) == 2
    })
    .await;
}

#[tokio::test]
async fn test_dispatch_before_init_is_flushed_by_init() {
    let transport = Arc::new(MockTransport::new(Snapshot::default()));
    let engine = SyncEngine::new(quiet_config(), transport.clone(), None);

    let early = Member::new("Early", "Organizer", "", "");
    engine.dispatch(Action::AddMember(early.clone()));
    assert_eq!(engine.members(), vec![early.clone()]);

    engine.init().await.unwrap();
    // The initial load replays the queued write over the empty result
    assert!(engine.members().contains(&early));

    eventually(WAIT, "queued write", || {
        transport.store().snapshot().members.contains(&early)
    })
    .await;
}

#[tokio::test]
async fn test_update_member_keeps_join_date() {
    let (engine, transport) = ready_engine(seeded_snapshot()).await;
    let original = member("m1", "Ada").join_date;

    let edited = Member {
        join_date: "1999-01-01T00:00:00.000Z".to_string(),
        ..member("m1", "Ada L.")
    };
    engine.dispatch(Action::UpdateMember(edited));

    let cached = engine.members().into_iter().find(|m| m.id == "m1").unwrap();
    assert_eq!(cached.name, "Ada L.");
    assert_eq!(cached.join_date, original);

    eventually(WAIT, "update stored", || {
        transport
            .store()
            .snapshot()
            .members
            .iter()
            .any(|m| m.id == "m1" && m.name == "Ada L.")
    })
    .await;
    let stored = transport.store().snapshot();
    assert_eq!(stored.members.iter().find(|m| m.id == "m1").unwrap().join_date, original);
}

#[tokio::test]
async fn test_re_adding_photo_keeps_upload_date() {
    let (engine, _transport) = ready_engine(seeded_snapshot()).await;

    let again = Photo {
        title: "Harbour at dusk".to_string(),
        upload_date: "2030-01-01T00:00:00.000Z".to_string(),
        ..photo("p1", "Harbour", 1)
    };
    engine.dispatch(Action::AddPhoto(again));

    let cached = engine.photos().into_iter().find(|p| p.id == "p1").unwrap();
    assert_eq!(cached.title, "Harbour at dusk");
    assert_eq!(cached.upload_date, photo("p1", "Harbour", 1).upload_date);
}

#[tokio::test]
async fn test_remote_update_sends_stored_join_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![member("m1", "Ada")]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<Photo>::new()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/members"))
        .and(query_param("id", "eq.m1"))
        .and(body_partial_json(serde_json::json!({
            "name": "Ada L.",
            "joinDate": "2024-01-01T00:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = Arc::new(RemoteTableTransport::new(
        reqwest::Client::new(),
        RemoteConfig::new(server.uri()),
    ));
    let engine = SyncEngine::new(quiet_config(), transport, None);
    engine.init().await.unwrap();

    engine.dispatch(Action::UpdateMember(Member {
        join_date: "1999-01-01T00:00:00.000Z".to_string(),
        ..member("m1", "Ada L.")
    }));

    eventually(WAIT, "write settled", || engine.status().pending_writes == 0).await;
    assert!(engine.take_errors().is_empty());
    engine.teardown();
}

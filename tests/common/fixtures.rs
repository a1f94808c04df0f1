//! Member, photo and configuration fixtures

use showcase_sync::shared::{Member, Photo, Snapshot, SyncConfig};
use std::collections::BTreeMap;
use std::time::Duration;

/// A member with a fixed id and join date
pub fn member(id: &str, name: &str) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        role: "Contributor".to_string(),
        bio: format!("{} builds things", name),
        avatar: format!("https://cdn.example.com/avatars/{}.png", id),
        join_date: "2024-01-01T00:00:00.000Z".to_string(),
        skills: vec!["rust".to_string()],
        social_links: BTreeMap::new(),
    }
}

/// A photo with a fixed id; `day` orders photos newest first
pub fn photo(id: &str, title: &str, day: u32) -> Photo {
    Photo {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        photographer: "Lee".to_string(),
        url: format!("https://cdn.example.com/gallery/{}.jpg", id),
        upload_date: format!("2024-03-{:02}T12:00:00.000Z", day),
    }
}

/// Two members and two photos
pub fn seeded_snapshot() -> Snapshot {
    Snapshot {
        members: vec![member("m1", "Ada"), member("m2", "Grace")],
        photos: vec![photo("p1", "Harbour", 1), photo("p2", "Skyline", 2)],
    }
}

/// Config with timers far enough out that only the test drives refreshes
pub fn quiet_config() -> SyncConfig {
    SyncConfig::builder()
        .poll_interval(Duration::from_secs(3600))
        .load_retry(1, Duration::from_millis(1))
        .subscribe_retry(1, Duration::from_millis(1))
        .build()
        .expect("valid test config")
}

//! Showcase Data Model
//!
//! The two tracked collections (members and gallery photos) plus the
//! whole-state `Snapshot` exchanged with the local storage proxy.
//!
//! Timestamps are kept as RFC 3339 strings exactly as they travel over the
//! wire so a stored snapshot round-trips byte for byte.

use crate::shared::error::SharedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the two tracked entity sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Members,
    Photos,
}

impl Collection {
    /// Both collections, members first
    pub const ALL: [Collection; 2] = [Collection::Members, Collection::Photos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Members => "members",
            Collection::Photos => "photos",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "members" => Ok(Collection::Members),
            // The remote project names the photo table `gallery`
            "photos" | "gallery" => Ok(Collection::Photos),
            other => Err(SharedError::validation(
                "collection",
                format!("unknown collection '{}'", other),
            )),
        }
    }
}

/// An entity stored in one of the tracked collections
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// The collection this entity lives in
    const COLLECTION: Collection;

    /// Opaque unique identifier
    fn id(&self) -> &str;

    /// Copy fields fixed at creation from the stored version of this entity
    fn keep_immutable(&mut self, _existing: &Self) {}
}

/// A community member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bio: String,
    /// URL or inline data URI
    #[serde(default, alias = "avatar_url")]
    pub avatar: String,
    /// Set once at creation
    #[serde(alias = "join_date")]
    pub join_date: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Platform name to profile URL
    #[serde(default, alias = "social_links")]
    pub social_links: BTreeMap<String, String>,
}

impl Member {
    /// Create a member with a fresh id and join date
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        bio: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            role: role.into(),
            bio: bio.into(),
            avatar: avatar.into(),
            join_date: now_rfc3339(),
            skills: Vec::new(),
            social_links: BTreeMap::new(),
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        let skill = skill.into();
        let trimmed = skill.trim();
        if !trimmed.is_empty() {
            self.skills.push(trimmed.to_string());
        }
        self
    }

    pub fn with_social_link(mut self, platform: impl Into<String>, url: impl Into<String>) -> Self {
        self.social_links.insert(platform.into(), url.into());
        self
    }

    /// Check the fields the admin form requires
    pub fn validate(&self) -> Result<(), SharedError> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        require("role", &self.role)?;
        require("joinDate", &self.join_date)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.role == other.role
            && self.bio == other.bio
            && self.avatar == other.avatar
            && self.join_date == other.join_date
            && self.social_links == other.social_links
            && same_skills(&self.skills, &other.skills)
    }
}

impl Eq for Member {}

/// Skill lists compare as multisets; display order is kept separately
fn same_skills(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}

impl Entity for Member {
    const COLLECTION: Collection = Collection::Members;

    fn id(&self) -> &str {
        &self.id
    }

    fn keep_immutable(&mut self, existing: &Self) {
        self.join_date.clone_from(&existing.join_date);
    }
}

/// A gallery item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photographer: String,
    /// Uploaded image URL or inline data URI
    #[serde(alias = "image_url")]
    pub url: String,
    /// Set once at creation
    #[serde(alias = "created_at", alias = "upload_date")]
    pub upload_date: String,
}

impl Photo {
    /// Create a photo with a fresh id and upload date
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        photographer: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            photographer: photographer.into(),
            url: url.into(),
            upload_date: now_rfc3339(),
        }
    }

    pub fn validate(&self) -> Result<(), SharedError> {
        require("id", &self.id)?;
        require("title", &self.title)?;
        require("url", &self.url)?;
        require("uploadDate", &self.upload_date)
    }
}

impl Entity for Photo {
    const COLLECTION: Collection = Collection::Photos;

    fn id(&self) -> &str {
        &self.id
    }

    fn keep_immutable(&mut self, existing: &Self) {
        self.upload_date.clone_from(&existing.upload_date);
    }
}

/// A single entity of either collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Member(Member),
    Photo(Photo),
}

impl Record {
    pub fn collection(&self) -> Collection {
        match self {
            Record::Member(_) => Collection::Members,
            Record::Photo(_) => Collection::Photos,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Member(member) => &member.id,
            Record::Photo(photo) => &photo.id,
        }
    }

    pub fn validate(&self) -> Result<(), SharedError> {
        match self {
            Record::Member(member) => member.validate(),
            Record::Photo(photo) => photo.validate(),
        }
    }

    /// JSON body for a table write
    pub fn to_json(&self) -> Result<serde_json::Value, SharedError> {
        let value = match self {
            Record::Member(member) => serde_json::to_value(member)?,
            Record::Photo(photo) => serde_json::to_value(photo)?,
        };
        Ok(value)
    }
}

/// The full contents of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Records {
    Members(Vec<Member>),
    Photos(Vec<Photo>),
}

impl Records {
    pub fn collection(&self) -> Collection {
        match self {
            Records::Members(_) => Collection::Members,
            Records::Photos(_) => Collection::Photos,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Members(items) => items.len(),
            Records::Photos(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A local write against one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert(Record),
    Update(Record),
    Delete { collection: Collection, id: String },
}

impl Mutation {
    pub fn collection(&self) -> Collection {
        match self {
            Mutation::Insert(record) | Mutation::Update(record) => record.collection(),
            Mutation::Delete { collection, .. } => *collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Mutation::Insert(record) | Mutation::Update(record) => record.id(),
            Mutation::Delete { id, .. } => id,
        }
    }
}

/// Whole-state document served by the local storage proxy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Snapshot {
    /// Extract one collection
    pub fn records(&self, collection: Collection) -> Records {
        match collection {
            Collection::Members => Records::Members(self.members.clone()),
            Collection::Photos => Records::Photos(self.photos.clone()),
        }
    }

    /// Apply a mutation, producing the full post-mutation state
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Insert(Record::Member(member)) => upsert(&mut self.members, member.clone()),
            Mutation::Insert(Record::Photo(photo)) => upsert(&mut self.photos, photo.clone()),
            Mutation::Update(Record::Member(member)) => {
                replace(&mut self.members, member.clone());
            }
            Mutation::Update(Record::Photo(photo)) => {
                replace(&mut self.photos, photo.clone());
            }
            Mutation::Delete { collection: Collection::Members, id } => {
                remove(&mut self.members, id);
            }
            Mutation::Delete { collection: Collection::Photos, id } => {
                remove(&mut self.photos, id);
            }
        }
    }

    /// Collections whose contents differ between two snapshots
    pub fn changed_collections(&self, other: &Snapshot) -> Vec<Collection> {
        let mut changed = Vec::new();
        if self.members != other.members {
            changed.push(Collection::Members);
        }
        if self.photos != other.photos {
            changed.push(Collection::Photos);
        }
        changed
    }
}

/// One page of the public gallery listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    pub items: Vec<Photo>,
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
}

impl GalleryPage {
    /// Build a page; `page` is 1-indexed
    pub fn new(items: Vec<Photo>, total_count: u64, page: u32, page_size: u32) -> Self {
        let has_more = u64::from(page) * u64::from(page_size) < total_count;
        Self {
            items,
            total_count,
            has_more,
        }
    }
}

/// Append, or replace in place when the id already exists. A replacement
/// keeps the stored creation timestamp.
pub fn upsert<T: Entity>(items: &mut Vec<T>, mut item: T) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => {
            item.keep_immutable(existing);
            *existing = item;
        }
        None => items.push(item),
    }
}

/// Replace the entity with the same id, keeping its creation timestamp;
/// unknown ids are ignored
pub fn replace<T: Entity>(items: &mut [T], mut item: T) -> bool {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => {
            item.keep_immutable(existing);
            *existing = item;
            true
        }
        None => false,
    }
}

/// Remove by id; unknown ids are ignored
pub fn remove<T: Entity>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|existing| existing.id() != id);
    items.len() != before
}

/// Members ordered by name, the order the remote table returns
pub fn sort_members(members: &mut [Member]) {
    members.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Photos newest first, by instant rather than by text. Dates that do not
/// parse as RFC 3339 sort after every parsed one.
pub fn sort_photos(photos: &mut [Photo]) {
    photos.sort_by_cached_key(|photo| Reverse(upload_instant(&photo.upload_date)));
}

fn upload_instant(value: &str) -> (Option<DateTime<Utc>>, String) {
    let parsed = DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|instant| instant.with_timezone(&Utc));
    (parsed, value.to_string())
}

fn require(field: &str, value: &str) -> Result<(), SharedError> {
    if value.trim().is_empty() {
        return Err(SharedError::validation(field, format!("{} is required", field)));
    }
    Ok(())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

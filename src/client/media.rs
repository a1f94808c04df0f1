//! Media upload: binary blob in, URL out.

use crate::client::error::TransportError;
use crate::shared::models::Collection;
use async_trait::async_trait;
use uuid::Uuid;

/// Uploads avatar and gallery images, returning their public URL
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(
        &self,
        collection: Collection,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, TransportError>;
}

/// Storage folder for a collection's media
pub fn folder_for(collection: Collection) -> &'static str {
    match collection {
        Collection::Members => "avatars",
        Collection::Photos => "gallery",
    }
}

/// Object path `{folder}/{uuid}.{ext}`; the original file name only
/// contributes its extension.
pub fn object_path(collection: Collection, file_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension(file_name) {
        Some(ext) => format!("{}/{}.{}", folder_for(collection), id, ext),
        None => format!("{}/{}", folder_for(collection), id),
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

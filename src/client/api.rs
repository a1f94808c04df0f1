//! Read-only catalog client for the public pages.
//!
//! Uses the storage server's read endpoints rather than the sync engine:
//! `GET /api/members` and the paginated `GET /api/gallery`.

use crate::client::error::{Operation, TransportCause, TransportError};
use crate::client::transport::check_status;
use crate::shared::models::{Collection, GalleryPage, Member};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryResponse {
    items: Vec<crate::shared::models::Photo>,
    total_count: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:4000`
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub async fn fetch_members(&self) -> Result<Vec<Member>, TransportError> {
        let url = format!("{}/api/members", self.base_url);
        let fail = |cause: TransportCause| {
            TransportError::new(Collection::Members, Operation::FetchAll, cause)
        };

        let response = self.client.get(&url).send().await.map_err(|e| fail(e.into()))?;
        let response = check_status(response).await.map_err(fail)?;
        response.json::<Vec<Member>>().await.map_err(|e| fail(e.into()))
    }

    /// Fetch one 1-indexed page of the gallery
    pub async fn fetch_gallery_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<GalleryPage, TransportError> {
        let page = page.max(1);
        let url = format!("{}/api/gallery", self.base_url);
        let fail = |cause: TransportCause| {
            TransportError::new(Collection::Photos, Operation::FetchAll, cause)
        };

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await
            .map_err(|e| fail(e.into()))?;
        let response = check_status(response).await.map_err(fail)?;
        let body = response
            .json::<GalleryResponse>()
            .await
            .map_err(|e| fail(e.into()))?;

        Ok(GalleryPage::new(body.items, body.total_count, page, page_size))
    }
}

//! Remote table store transport
//!
//! Talks the PostgREST dialect exposed by the hosted Postgres backend:
//!
//! - `GET  /rest/v1/{table}?select=*&order=name.asc`
//! - `POST /rest/v1/{table}` with a one-element array body
//! - `PATCH /rest/v1/{table}?id=eq.{id}`
//! - `DELETE /rest/v1/{table}?id=eq.{id}`
//!
//! Members are read ordered by name, photos by the configured upload column
//! newest first. The same client also uploads media blobs to the storage API.

use super::{check_status, Transport};
use crate::client::error::{Operation, TransportCause, TransportError};
use crate::client::media::MediaUploader;
use crate::shared::config::RemoteConfig;
use crate::shared::models::{Collection, Member, Photo, Record, Records};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

/// Transport over the remote table store
#[derive(Debug, Clone)]
pub struct RemoteTableTransport {
    client: Client,
    config: RemoteConfig,
}

impl RemoteTableTransport {
    pub fn new(client: Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    pub fn table(&self, collection: Collection) -> &str {
        match collection {
            Collection::Members => &self.config.members_table,
            Collection::Photos => &self.config.photos_table,
        }
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.config.rest_url(), self.table(collection))
    }

    /// `order=` clause for ordered reads
    fn order_clause(&self, collection: Collection) -> String {
        match collection {
            Collection::Members => "name.asc".to_string(),
            Collection::Photos => format!("{}.desc", self.config.photos_order_column),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn send(
        &self,
        collection: Collection,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| TransportError::new(collection, operation, e))?;
        check_status(response)
            .await
            .map_err(|cause| TransportError::new(collection, operation, cause))
    }

    fn record_body(
        record: &Record,
        operation: Operation,
    ) -> Result<serde_json::Value, TransportError> {
        record.to_json().map_err(|e| {
            let cause = TransportCause::Decode(e.to_string());
            TransportError::new(record.collection(), operation, cause)
        })
    }
}

#[async_trait]
impl Transport for RemoteTableTransport {
    fn name(&self) -> &'static str {
        "remote-table"
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Records, TransportError> {
        let order = self.order_clause(collection);
        let request = self
            .client
            .get(self.table_url(collection))
            .query(&[("select", "*"), ("order", order.as_str())]);
        let response = self.send(collection, Operation::FetchAll, request).await?;

        let records = match collection {
            Collection::Members => Records::Members(
                response
                    .json::<Vec<Member>>()
                    .await
                    .map_err(|e| TransportError::new(collection, Operation::FetchAll, e))?,
            ),
            Collection::Photos => Records::Photos(
                response
                    .json::<Vec<Photo>>()
                    .await
                    .map_err(|e| TransportError::new(collection, Operation::FetchAll, e))?,
            ),
        };
        tracing::debug!(
            "[Transport] Fetched {} rows from {}",
            records.len(),
            self.table(collection)
        );
        Ok(records)
    }

    async fn insert(&self, record: Record) -> Result<(), TransportError> {
        let collection = record.collection();
        let body = Self::record_body(&record, Operation::Insert)?;
        let request = self
            .client
            .post(self.table_url(collection))
            .header("Prefer", "return=minimal")
            .json(&[body]);
        self.send(collection, Operation::Insert, request).await?;
        Ok(())
    }

    async fn update(&self, record: Record) -> Result<(), TransportError> {
        let collection = record.collection();
        let body = Self::record_body(&record, Operation::Update)?;
        let request = self
            .client
            .patch(self.table_url(collection))
            .query(&[("id", format!("eq.{}", record.id()))])
            .header("Prefer", "return=minimal")
            .json(&body);
        self.send(collection, Operation::Update, request).await?;
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), TransportError> {
        let request = self
            .client
            .delete(self.table_url(collection))
            .query(&[("id", format!("eq.{}", id))]);
        self.send(collection, Operation::Remove, request).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for RemoteTableTransport {
    async fn upload(
        &self,
        collection: Collection,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, TransportError> {
        let path = crate::client::media::object_path(collection, file_name);
        let storage = self.config.storage_url();
        let bucket = &self.config.media_bucket;

        let request = self
            .client
            .post(format!("{}/object/{}/{}", storage, bucket, path))
            .header("Content-Type", content_type)
            .body(bytes);
        self.send(collection, Operation::Upload, request).await?;

        let public_url = format!("{}/object/public/{}/{}", storage, bucket, path);
        tracing::info!("[Transport] Uploaded media to {}", public_url);
        Ok(public_url)
    }
}

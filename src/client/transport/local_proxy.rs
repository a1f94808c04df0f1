//! Local storage proxy transport
//!
//! The proxy has no partial-write primitive: `GET {endpoint}` returns the
//! whole `{members, photos}` snapshot and `POST {endpoint}` overwrites it.
//! Every mutation is therefore a read-modify-write of the complete snapshot,
//! serialised through `write_lock` so two concurrent writes cannot lose each
//! other's changes.

use super::{check_status, operation_of, Transport};
use crate::client::error::{Operation, TransportCause, TransportError};
use crate::shared::models::{Collection, Mutation, Record, Records, Snapshot};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct SaveResponse {
    success: bool,
}

/// Transport over the whole-snapshot JSON endpoint
#[derive(Debug)]
pub struct LocalProxyTransport {
    client: Client,
    endpoint: String,
    write_lock: Mutex<()>,
}

impl LocalProxyTransport {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the whole stored snapshot
    pub async fn load_snapshot(&self) -> Result<Snapshot, TransportCause> {
        let response = self.client.get(&self.endpoint).send().await?;
        let response = check_status(response).await?;
        let snapshot = response.json::<Snapshot>().await?;
        Ok(snapshot)
    }

    /// POST the whole snapshot, replacing what the proxy stores
    pub async fn store_snapshot(&self, snapshot: &Snapshot) -> Result<(), TransportCause> {
        let response = self.client.post(&self.endpoint).json(snapshot).send().await?;
        let response = check_status(response).await?;
        let saved = response.json::<SaveResponse>().await?;
        if !saved.success {
            return Err(TransportCause::Rejected(
                "storage proxy reported success=false".to_string(),
            ));
        }
        Ok(())
    }

    async fn write(&self, mutation: &Mutation) -> Result<(), TransportError> {
        let collection = mutation.collection();
        let operation = operation_of(mutation);
        let _guard = self.write_lock.lock().await;

        let mut snapshot = self
            .load_snapshot()
            .await
            .map_err(|cause| TransportError::new(collection, operation, cause))?;
        snapshot.apply(mutation);

        tracing::debug!(
            "[Transport] Posting full snapshot ({} members, {} photos) after {} {}",
            snapshot.members.len(),
            snapshot.photos.len(),
            operation,
            mutation.id()
        );

        self.store_snapshot(&snapshot)
            .await
            .map_err(|cause| TransportError::new(collection, operation, cause))
    }
}

#[async_trait]
impl Transport for LocalProxyTransport {
    fn name(&self) -> &'static str {
        "local-proxy"
    }

    async fn fetch_all(&self, collection: Collection) -> Result<Records, TransportError> {
        let snapshot = self
            .load_snapshot()
            .await
            .map_err(|cause| TransportError::new(collection, Operation::FetchAll, cause))?;
        Ok(snapshot.records(collection))
    }

    async fn insert(&self, record: Record) -> Result<(), TransportError> {
        self.write(&Mutation::Insert(record)).await
    }

    async fn update(&self, record: Record) -> Result<(), TransportError> {
        self.write(&Mutation::Update(record)).await
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), TransportError> {
        self.write(&Mutation::Delete {
            collection,
            id: id.to_string(),
        })
        .await
    }

    async fn apply(&self, mutation: &Mutation) -> Result<(), TransportError> {
        self.write(mutation).await
    }
}

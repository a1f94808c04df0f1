//! # Transport Adapter
//!
//! A uniform interface over the backends the showcase data can live in:
//!
//! - `local_proxy.rs`: whole-snapshot JSON endpoint (GET everything, POST
//!   everything). Every write sends the complete post-mutation state.
//! - `remote_table.rs`: remote table store with per-row writes and ordered
//!   reads.
//! - `memory.rs`: in-process table store that also publishes change events,
//!   for demos and tests.
//!
//! The adapter is chosen once at startup from `SyncConfig::mode` via
//! [`build_transport`] and cannot be switched while an engine runs.

pub mod local_proxy;
pub mod memory;
pub mod remote_table;

pub use local_proxy::LocalProxyTransport;
pub use memory::MemoryTransport;
pub use remote_table::RemoteTableTransport;

use crate::client::error::{Operation, TransportCause, TransportError};
use crate::shared::config::{ConfigError, SyncConfig, TransportMode};
use crate::shared::models::{Collection, Mutation, Record, Records};
use async_trait::async_trait;
use std::sync::Arc;

/// Uniform CRUD interface over a backend
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Human-readable backend name used in logs
    fn name(&self) -> &'static str;

    /// Read the whole collection in its canonical order
    async fn fetch_all(&self, collection: Collection) -> Result<Records, TransportError>;

    async fn insert(&self, record: Record) -> Result<(), TransportError>;

    /// Overwrite the entity carrying the same id
    async fn update(&self, record: Record) -> Result<(), TransportError>;

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), TransportError>;

    /// Forward a local mutation
    async fn apply(&self, mutation: &Mutation) -> Result<(), TransportError> {
        match mutation {
            Mutation::Insert(record) => self.insert(record.clone()).await,
            Mutation::Update(record) => self.update(record.clone()).await,
            Mutation::Delete { collection, id } => self.remove(*collection, id).await,
        }
    }
}

/// Construct the transport selected by configuration
pub fn build_transport(config: &SyncConfig) -> Result<Arc<dyn Transport>, ConfigError> {
    config.validate()?;
    let client = reqwest::Client::new();

    let transport: Arc<dyn Transport> = match config.mode {
        TransportMode::Local => Arc::new(LocalProxyTransport::new(client, &config.local_endpoint)),
        TransportMode::RemoteTable => {
            let remote = config
                .remote
                .clone()
                .ok_or(ConfigError::MissingValue("remote.url"))?;
            Arc::new(RemoteTableTransport::new(client, remote))
        }
    };

    tracing::info!("[Transport] Using {} transport", transport.name());
    Ok(transport)
}

/// Map a mutation to the operation name used in errors
pub(crate) fn operation_of(mutation: &Mutation) -> Operation {
    match mutation {
        Mutation::Insert(_) => Operation::Insert,
        Mutation::Update(_) => Operation::Update,
        Mutation::Delete { .. } => Operation::Remove,
    }
}

/// Turn a non-success response into a transport cause
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, TransportCause> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    Err(TransportCause::Status {
        status: status.as_u16(),
        body,
    })
}

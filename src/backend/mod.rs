//! Backend Module
//!
//! The storage server behind local-proxy mode. Only compiled with the
//! `server` feature.
//!
//! # Architecture
//!
//! - **`server`** - configuration, shared state, app creation
//! - **`routes`** - router assembly
//! - **`storage`** - snapshot file and the `/api/data` proxy endpoint
//! - **`catalog`** - cached members and gallery read endpoints
//! - **`realtime`** - change event broadcast and the SSE stream
//! - **`error`** - backend error type and its JSON response form
//!
//! # Data Flow
//!
//! A `POST /api/data` replaces the stored snapshot, evicts cached reads of
//! every changed collection and broadcasts one `ChangeEvent` per changed
//! collection to `/api/realtime` subscribers. Sync engines listening on the
//! stream then re-fetch the whole collection.

pub mod catalog;
pub mod error;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod storage;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};

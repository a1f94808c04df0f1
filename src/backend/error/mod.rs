//! Backend error types and their HTTP conversion

pub mod types;

pub mod conversion;

pub use types::BackendError;

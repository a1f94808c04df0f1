//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A scriptable transport that counts fetches and injects failures
//! - Member and photo fixtures
//! - Custom assertion macros and an `eventually` poller

#[macro_use]
pub mod assertions;
pub mod fixtures;
pub mod mock_transport;

// Re-export commonly used utilities
pub use assertions::*;
pub use fixtures::*;
pub use mock_transport::*;

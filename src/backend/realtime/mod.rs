//! Real-time change notifications
//!
//! - `broadcast` - the change event channel and publish helper
//! - `subscription` - the SSE endpoint and the realtime-init cache flush

pub mod broadcast;
pub mod subscription;

pub use broadcast::{broadcast_change, ChangeBroadcast};

//! Cached public read endpoints for members and the gallery

pub mod cache;
pub mod handlers;

pub use cache::{CacheKey, ResponseCache};

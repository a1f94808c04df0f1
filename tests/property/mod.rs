//! Property-based tests

pub mod cache_proptest;

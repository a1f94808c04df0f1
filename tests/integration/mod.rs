//! Integration tests

pub mod change_feed_test;
pub mod dispatcher_test;
pub mod transport_test;

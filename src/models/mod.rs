//! Data models shared across stores, services, and handlers.

pub mod api_key;
pub mod content;
pub mod request_log;
pub mod rpc;

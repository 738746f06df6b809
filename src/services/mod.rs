//! Core services: key management, rate limiting, and request dispatch.

pub mod dispatcher;
pub mod keys;
pub mod rate_limit;

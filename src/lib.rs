//! Read-only JSON-RPC content API server.
//!
//! A single `POST /api/v1/mcp` endpoint exposes published content over
//! JSON-RPC 2.0 to authenticated machine clients. Keys are issued and
//! revoked through a small bearer-token admin surface, every admitted
//! request is rate limited against a rolling hour and logged, and the
//! content itself is never writable through this API.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod net;
pub mod server;
pub mod services;
pub mod state;
pub mod store;

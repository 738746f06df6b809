//! Application configuration management.
//!
//! Configuration comes from environment variables, deserialized with the
//! `envy` crate into a type-safe struct. The runtime-facing view is
//! [`ApiSettings`], an immutable snapshot handed to the dispatcher and
//! handlers at startup; no component reads ambient configuration later.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `API_ENABLED` (optional): master switch, defaults to true
/// - `RATE_LIMIT` (optional): default per-key requests/hour, defaults to 100
/// - `ALLOWED_CONTENT_TYPES` (optional): comma-separated list, defaults to `post,page`
/// - `SECURITY_LOGGING` (optional): write request log entries, defaults to true
/// - `DEBUG_MODE` (optional): verbose dispatcher diagnostics, defaults to false
/// - `PUBLIC_URL` (optional): externally visible base URL for the probe endpoint
/// - `ADMIN_TOKEN` (optional): bearer token for the key-management routes;
///   when unset the admin surface rejects everything
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_true")]
    pub api_enabled: bool,

    #[serde(default = "default_rate_limit")]
    pub rate_limit: i32,

    #[serde(default = "default_allowed_types")]
    pub allowed_content_types: String,

    #[serde(default = "default_true")]
    pub security_logging: bool,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub public_url: Option<String>,

    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_rate_limit() -> i32 {
    100
}

fn default_allowed_types() -> String {
    "post,page".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Attempts to load a `.env` file first (optional), then deserializes
    /// the environment. Field names map to upper-cased variable names.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
    }

    /// Build the immutable settings snapshot consumed by the request pipeline.
    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            api_enabled: self.api_enabled,
            default_rate_limit: self.rate_limit,
            allowed_content_types: self
                .allowed_content_types
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            security_logging: self.security_logging,
            debug_mode: self.debug_mode,
            public_url: self
                .public_url
                .clone()
                .unwrap_or_else(|| format!("http://localhost:{}", self.server_port)),
            admin_token: self.admin_token.clone(),
        }
    }
}

/// Immutable configuration snapshot threaded through the request pipeline.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Master switch; when false the RPC endpoint refuses all dispatch.
    pub api_enabled: bool,

    /// Requests per rolling hour assigned to newly generated keys.
    pub default_rate_limit: i32,

    /// Content types handlers are allowed to expose.
    pub allowed_content_types: Vec<String>,

    /// Whether to write a request log entry per dispatched request.
    pub security_logging: bool,

    /// Verbose per-request dispatcher diagnostics.
    pub debug_mode: bool,

    /// Externally visible base URL, used to compute the probe endpoint URL.
    pub public_url: String,

    /// Bearer token guarding the administrative routes.
    pub admin_token: Option<String>,
}

impl ApiSettings {
    pub fn is_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_content_types.iter().any(|t| t == content_type)
    }

    /// Full URL of the JSON-RPC endpoint, as reported by the probe.
    pub fn endpoint_url(&self) -> String {
        format!("{}/api/v1/mcp", self.public_url.trim_end_matches('/'))
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_enabled: true,
            default_rate_limit: default_rate_limit(),
            allowed_content_types: vec!["post".to_string(), "page".to_string()],
            security_logging: true,
            debug_mode: false,
            public_url: "http://localhost:3000".to_string(),
            admin_token: None,
        }
    }
}

//! Document store configuration.

use serde::{Deserialize, Serialize};

/// Document store provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    /// Store provider: `"postgres"` (JSONB collections) or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Connection URL for the `postgres` provider.
    #[serde(default)]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_provider() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}

//! Identifier allocator configuration.

use serde::{Deserialize, Serialize};

/// Settings for the collision-checked identifier allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Number of candidates tried before allocation fails.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

mod defaults;
mod projection_config;
mod recompute_config;

pub use projection_config::ProjectionConfig;
pub use recompute_config::RecomputeConfig;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the growth-tracking core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NidoConfig {
    pub recompute: RecomputeConfig,
    pub projection: ProjectionConfig,
}

impl NidoConfig {
    /// Parse a TOML document; absent sections fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

//! Generator configuration.

use serde::{Deserialize, Serialize};

/// Project-wide constants for one generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Highest ID any kind may assign, inclusive.
    pub max_id: u32,
    /// Component mask widths above this need an explicitly-sized storage
    /// representation.
    pub custom_storage_threshold: u32,
}

impl GeneratorConfig {
    pub const DEFAULT_MAX_ID: u32 = 4095;
    pub const DEFAULT_CUSTOM_STORAGE_THRESHOLD: u32 = 1024;

    /// Override the maximum ID.
    #[must_use]
    pub fn with_max_id(mut self, max_id: u32) -> Self {
        self.max_id = max_id;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_id: Self::DEFAULT_MAX_ID,
            custom_storage_threshold: Self::DEFAULT_CUSTOM_STORAGE_THRESHOLD,
        }
    }
}

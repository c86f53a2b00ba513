//! `[stats]` section configuration: terminal output of a build.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Force colors on or off (the `--color` flag wins when given).
    pub colors: Option<bool>,

    /// Print the emitted asset table after a successful build.
    pub assets: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            colors: None,
            assets: true,
        }
    }
}

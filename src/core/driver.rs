//! Build mode selection for development/production builds.

use serde::{Deserialize, Serialize};

/// Build mode. Selects the overlay document and gates mode-restricted plugins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Development mode: readable output, source maps.
    #[value(alias = "dev")]
    Development,
    /// Production mode: optimized output.
    #[default]
    #[value(alias = "prod")]
    Production,
}

/// Environment variables consulted for the mode, in order.
pub const MODE_ENV_VARS: &[&str] = &["RAZORPACK_MODE", "NODE_ENV"];

impl BuildMode {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Parse a mode name, accepting the short aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Mode from the process environment (`RAZORPACK_MODE`, then `NODE_ENV`).
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Mode from an arbitrary variable lookup. Unparseable values are skipped.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        MODE_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find_map(|value| Self::parse(&value))
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(BuildMode::parse("dev"), Some(BuildMode::Development));
        assert_eq!(BuildMode::parse("Production"), Some(BuildMode::Production));
        assert_eq!(BuildMode::parse("staging"), None);
    }

    #[test]
    fn test_from_vars_precedence() {
        let vars = |key: &str| match key {
            "RAZORPACK_MODE" => Some("development".to_string()),
            "NODE_ENV" => Some("production".to_string()),
            _ => None,
        };
        assert_eq!(BuildMode::from_vars(vars), Some(BuildMode::Development));

        // Falls back to NODE_ENV when the first variable is unusable
        let vars = |key: &str| match key {
            "RAZORPACK_MODE" => Some("staging".to_string()),
            "NODE_ENV" => Some("dev".to_string()),
            _ => None,
        };
        assert_eq!(BuildMode::from_vars(vars), Some(BuildMode::Development));

        assert_eq!(BuildMode::from_vars(|_| None), None);
    }
}

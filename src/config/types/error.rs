//! Configuration errors and collected diagnostics.

use super::FieldPath;
use crate::config::merge::MergeError;
use crate::utils::plural_count;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Configuration failures. All of them are fatal before any asset work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("`{}` is not valid TOML", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("cannot merge overlay `{}`", .0.display())]
    Merge(PathBuf, #[source] MergeError),

    #[error("invalid configuration: {0}")]
    Shape(#[from] serde_json::Error),

    // no #[source]: the diagnostics are the whole message
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

// ============================================================================
// ConfigDiagnostic
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding about one config field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    /// e.g. `module.rules[2].test`
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl ConfigDiagnostic {
    pub fn new(field: FieldPath, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// `module.rules[2].test: unknown stage `less``, then the hint on its own line.
impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.as_str().cyan(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {hint}", "hint:".yellow())?;
        }
        Ok(())
    }
}

// ============================================================================
// ConfigDiagnostics
// ============================================================================

/// Everything validation found, in the order it was found.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    items: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.items.push(ConfigDiagnostic::new(field, message));
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigDiagnostic::new(field, message).with_hint(hint));
    }

    /// Non-fatal finding, logged when the diagnostics are resolved.
    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.items.push(ConfigDiagnostic {
            severity: Severity::Warning,
            ..ConfigDiagnostic::new(field, message)
        });
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(ConfigDiagnostic::is_error)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors().len()
    }

    pub fn errors(&self) -> Vec<&ConfigDiagnostic> {
        self.items.iter().filter(|d| d.is_error()).collect()
    }

    pub fn warnings(&self) -> Vec<&ConfigDiagnostic> {
        self.items.iter().filter(|d| !d.is_error()).collect()
    }

    /// Log the warnings, then fail if any error was recorded.
    pub fn into_result(self) -> Result<(), ConfigError> {
        for warning in self.warnings() {
            crate::log!("warning"; "{}: {}", warning.field.as_str(), warning.message);
        }
        if self.has_errors() {
            Err(ConfigError::Diagnostics(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors();
        write!(
            f,
            "{}",
            format!("invalid configuration ({})", plural_count(errors.len(), "error")).bold()
        )?;
        for err in errors {
            write!(f, "\n  {} {err}", "→".red())?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

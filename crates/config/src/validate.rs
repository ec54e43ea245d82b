//! Configuration validation.
//!
//! Checks a loaded [`RegnumConfig`] for values the command client cannot
//! work with and for settings that are legal but probably unintended.

use crate::schema::RegnumConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "commands.default_prefix"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
#[must_use]
pub fn validate(config: &RegnumConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let cmds = &config.commands;

    if cmds.default_prefix.is_empty() {
        result.push(
            Severity::Error,
            "commands.default_prefix",
            "prefix must not be empty; every message would be a command",
        );
    } else if cmds.default_prefix.chars().any(char::is_whitespace) {
        result.push(
            Severity::Warning,
            "commands.default_prefix",
            "prefix contains whitespace and will never match a tokenized alias",
        );
    }

    if cmds.max_concurrent_commands == 0 {
        result.push(
            Severity::Error,
            "commands.max_concurrent_commands",
            "must be at least 1 or no command can ever run",
        );
    }

    if cmds.event_capacity == 0 {
        result.push(
            Severity::Error,
            "commands.event_capacity",
            "must be at least 1",
        );
    }

    if cmds.owner_bypass && cmds.owners.is_empty() {
        result.push(
            Severity::Info,
            "commands.owner_bypass",
            "enabled but no owners are configured",
        );
    }

    if cmds.permission_error_message.trim().is_empty() {
        result.push(
            Severity::Warning,
            "commands.permission_error_message",
            "empty message; denied users will receive a blank DM",
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_errors() {
        let result = validate(&RegnumConfig::default());
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Info), 1);
    }

    #[test]
    fn empty_prefix_is_error() {
        let mut cfg = RegnumConfig::default();
        cfg.commands.default_prefix.clear();
        let result = validate(&cfg);
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "commands.default_prefix");
    }

    #[test]
    fn whitespace_prefix_is_warning() {
        let mut cfg = RegnumConfig::default();
        cfg.commands.default_prefix = "hey bot".into();
        cfg.commands.owners = vec![1];
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn zero_concurrency_is_error() {
        let mut cfg = RegnumConfig::default();
        cfg.commands.max_concurrent_commands = 0;
        assert!(validate(&cfg).has_errors());
    }
}

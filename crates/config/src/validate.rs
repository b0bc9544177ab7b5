//! Configuration validation.
//!
//! Checks a loaded [`FanoutConfig`] for values the bot cannot start with and
//! for settings that are legal but likely to misbehave.

use std::collections::HashSet;

use secrecy::ExposeSecret;

use crate::{error::Error, schema::FanoutConfig};

/// Telegram rejects bursts above roughly this many messages per second.
const TELEGRAM_BURST_LIMIT: usize = 30;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.owner_id"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
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

    /// Warnings only, or every diagnostic as [`Error::Invalid`] when any of
    /// them is an error.
    pub fn into_result(self) -> crate::Result<Vec<Diagnostic>> {
        if self.has_errors() {
            Err(Error::Invalid {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.diagnostics)
        }
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &FanoutConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.telegram.token.expose_secret();
    if token.trim().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token is required (set it in the config file or FANOUT_TOKEN)",
        );
    } else if token.contains("${") {
        result.push(
            Severity::Error,
            "telegram.token",
            "token contains an unresolved ${...} placeholder",
        );
    }

    if config.telegram.owner_id == 0 {
        result.push(
            Severity::Error,
            "telegram.owner_id",
            "operator user id is required (set it in the config file or FANOUT_OWNER_ID)",
        );
    }
    if config.telegram.poll_timeout_secs == 0 {
        result.push(
            Severity::Warning,
            "telegram.poll_timeout_secs",
            "0 disables long polling and busy-loops getUpdates",
        );
    }
    if config.telegram.send_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "telegram.send_timeout_secs",
            "must be at least 1 second",
        );
    }

    if config.channels.is_empty() {
        result.push(
            Severity::Error,
            "channels",
            "at least one broadcast channel is required",
        );
    }
    let mut seen = HashSet::new();
    for (i, channel) in config.channels.iter().enumerate() {
        if !seen.insert(*channel) {
            result.push(
                Severity::Error,
                &format!("channels[{i}]"),
                format!("channel {channel} is listed more than once"),
            );
        }
        if channel.0 > 0 {
            result.push(
                Severity::Warning,
                &format!("channels[{i}]"),
                format!("channel {channel} is a positive id; channel and group ids are negative"),
            );
        }
    }

    if config.dispatch.concurrency == 0 {
        result.push(
            Severity::Error,
            "dispatch.concurrency",
            "must be at least 1",
        );
    } else if config.dispatch.concurrency > TELEGRAM_BURST_LIMIT {
        result.push(
            Severity::Warning,
            "dispatch.concurrency",
            format!(
                "more than {TELEGRAM_BURST_LIMIT} concurrent copies will hit Telegram flood limits"
            ),
        );
    }

    result
}

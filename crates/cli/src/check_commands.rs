//! `fanout check`: validate the configuration without connecting to Telegram.
//!
//! Prints the effective settings, every validation diagnostic, and the
//! channel positions the keyboard will show. Exits non-zero when the bot
//! could not start with this config.

use std::{fmt, path::Path};

use {
    anyhow::Result,
    fanout_broadcast::ChannelId,
    fanout_config::{Diagnostic, FanoutConfig, Severity, validate},
    secrecy::ExposeSecret,
};

/// Everything `fanout check` reports about one config.
struct Report {
    source: String,
    settings: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    channels: Vec<ChannelId>,
}

impl Report {
    fn build(config: &FanoutConfig, source: Option<&Path>) -> Self {
        let telegram = &config.telegram;
        let token = if telegram.token.expose_secret().trim().is_empty() {
            "not set"
        } else {
            "set"
        };
        let settings = vec![
            format!("token: {token}"),
            format!("operator: {}", telegram.owner_id),
            format!(
                "poll timeout {}s, send timeout {}s",
                telegram.poll_timeout_secs, telegram.send_timeout_secs
            ),
            format!(
                "session scope: {:?}, dispatch concurrency: {}",
                config.session_scope,
                config.dispatch.concurrency()
            ),
        ];

        // Duplicates and an empty list already show up as diagnostics.
        let channels = config
            .channel_list()
            .map(|list| list.iter().collect())
            .unwrap_or_default();

        Self {
            source: source
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults + environment".into()),
            settings,
            diagnostics: validate(config).diagnostics,
            channels,
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config: {}", self.source)?;
        for line in &self.settings {
            writeln!(f, "  {line}")?;
        }

        writeln!(f, "\nChannels ({}):", self.channels.len())?;
        for (index, channel) in self.channels.iter().enumerate() {
            writeln!(f, "  Channel {} → {channel}", index + 1)?;
        }

        writeln!(f)?;
        if self.diagnostics.is_empty() {
            writeln!(f, "No problems found.")?;
        }
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        write!(
            f,
            "Summary: {} error(s), {} warning(s)",
            self.count(Severity::Error),
            self.count(Severity::Warning)
        )
    }
}

/// Print the report for `config`. Exits with status 1 on errors.
pub fn handle_check(config: &FanoutConfig, source: Option<&Path>) -> Result<()> {
    let report = Report::build(config, source);
    eprintln!("{report}");

    if report.count(Severity::Error) > 0 {
        std::process::exit(1);
    }
    Ok(())
}

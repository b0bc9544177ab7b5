//! Configuration loading, validation, and env substitution.
//!
//! Config files: `fanout.toml`, `fanout.yaml`, or `fanout.json`
//! Searched in `./` then `~/.config/fanout/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{DispatchConfig, FanoutConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};

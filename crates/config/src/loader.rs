use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::FanoutConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["fanout.toml", "fanout.yaml", "fanout.yml", "fanout.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<FanoutConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load config from `explicit` or from the standard locations, then apply
/// environment overrides.
///
/// Search order when no explicit path is given:
/// 1. `./fanout.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/fanout/fanout.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `FanoutConfig::default()` when no file is found, so a
/// deployment can be configured entirely through the environment. Returns the
/// path that was loaded, if any.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<(FanoutConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let mut config = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => {
            debug!("no config file found, using defaults");
            FanoutConfig::default()
        },
    };

    apply_env_overrides(&mut config);
    Ok((config, path))
}

/// Override config values from `FANOUT_*` environment variables.
///
/// `TOKEN` and `OWNER_ID` are accepted as fallbacks for older `.env` files.
pub fn apply_env_overrides(config: &mut FanoutConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut FanoutConfig, lookup: impl Fn(&str) -> Option<String>) {
    let first = |names: &[&str]| {
        names
            .iter()
            .find_map(|&name| lookup(name).filter(|v| !v.trim().is_empty()))
    };

    if let Some(token) = first(&["FANOUT_TOKEN", "TOKEN"]) {
        config.telegram.token = Secret::new(token.trim().to_string());
    }
    if let Some(raw) = first(&["FANOUT_OWNER_ID", "OWNER_ID"]) {
        match raw.trim().parse::<u64>() {
            Ok(owner_id) => config.telegram.owner_id = owner_id,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid owner id override"),
        }
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/fanout/
    if let Some(config_dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/fanout/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "fanout").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<FanoutConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

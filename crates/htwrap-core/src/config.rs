//! Persisted httrack options (`~/.config/httrack-wrapper/config.json`).
//!
//! The file is a flat JSON object. Switches are typed; depths and the size
//! ceiling are kept as whatever JSON value was posted, and anything else the
//! form (or a hand edit) puts there is kept in `extra` and written back as-is.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// XDG prefix shared by the config, auth-data and log files.
pub const APP_PREFIX: &str = "httrack-wrapper";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Android 10; Mobile; rv:121.0) Firefox/121.0";

/// Options rendered into the httrack command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Sent by httrack as `--user-agent`.
    pub user_agent: String,
    /// Recursion depth (`-r`).
    pub max_depth: OptionValue,
    /// External link depth (`-m`).
    pub max_external_depth: OptionValue,
    /// Size ceiling passed through to `-M` (e.g. "10M").
    pub max_size: OptionValue,
    /// Follow robots.txt; false adds `-s0`.
    pub robots: bool,
    /// Accept cookies; true adds `-b0`.
    pub cookies: bool,
    /// Update an existing mirror; true adds `-u`.
    pub update: bool,
    /// Continue an interrupted mirror; true adds `-c`.
    #[serde(rename = "continue")]
    pub continue_interrupted: bool,
    /// Keys we don't interpret, preserved on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_depth: 5.into(),
            max_external_depth: 1.into(),
            max_size: "10M".into(),
            robots: true,
            cookies: true,
            update: false,
            continue_interrupted: false,
            extra: Map::new(),
        }
    }
}

/// An option value stored verbatim and rendered as text on the command line.
///
/// The form posts number inputs as strings, so `"7"`, `7`, `""` and `"-1"` are
/// all kept exactly as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionValue(Value);

impl OptionValue {
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl From<u32> for OptionValue {
    fn from(n: u32) -> Self {
        Self(Value::from(n))
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self(Value::from(s))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&value_text(&self.0))
    }
}

/// Command-line text for a JSON value: strings raw, `True`/`False`/`None` for
/// booleans and null, JSON text for everything else.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

impl MirrorConfig {
    /// Shallow-merge `overrides` into this config; later values win.
    ///
    /// On a type mismatch for a switch (e.g. `robots: "yes"`) returns Err and
    /// leaves `self` untouched.
    pub fn merge(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        let mut current = match serde_json::to_value(&*self).context("serialize config")? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            current.insert(key.clone(), value.clone());
        }
        let merged: MirrorConfig =
            serde_json::from_value(Value::Object(current)).context("invalid option value")?;
        *self = merged;
        Ok(())
    }
}

/// Default config file path, creating the parent directory if needed.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.place_config_file("config.json")?)
}

/// Owns the in-memory config and the file it is persisted to.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: MirrorConfig,
}

impl ConfigStore {
    /// Open the store at the default XDG location.
    pub fn open_default() -> Result<Self> {
        Self::open_at(config_path()?)
    }

    /// Load configuration from `path`, creating a default file if none exists.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            let store = Self {
                path,
                config: MirrorConfig::default(),
            };
            store.save()?;
            tracing::info!("created default config at {}", store.path.display());
            return Ok(store);
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: MirrorConfig = serde_json::from_str(&data)
            .with_context(|| format!("parse config: {}", path.display()))?;
        Ok(Self { path, config })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge `overrides` and rewrite the whole file.
    pub fn merge_and_persist(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        self.config.merge(overrides)?;
        self.save()
    }

    /// Overwrite the config file with the current in-memory config.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.config).context("serialize config")?;
        fs::write(&self.path, json)
            .with_context(|| format!("write config: {}", self.path.display()))?;
        Ok(())
    }
}

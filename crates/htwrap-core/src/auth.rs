//! Captured auth data (`~/.config/httrack-wrapper/auth_data.json`).
//!
//! Whatever the credential form submits is stored verbatim; nothing here
//! checks that it works. The only field we read back is `cookies`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{value_text, APP_PREFIX};

/// One form submission: username/password/tfa plus anything else posted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthData {
    pub fields: Map<String, Value>,
}

impl AuthData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The `cookies` mapping, if present, an object, and non-empty.
    pub fn cookies(&self) -> Option<&Map<String, Value>> {
        match self.fields.get("cookies") {
            Some(Value::Object(map)) if !map.is_empty() => Some(map),
            _ => None,
        }
    }

    /// Cookies as `k=v; k2=v2`, in stored order. Values use the same text
    /// as option values (`5`, `True`, `None`).
    pub fn cookie_string(&self) -> Option<String> {
        let cookies = self.cookies()?;
        let pairs: Vec<String> = cookies
            .iter()
            .map(|(name, value)| format!("{name}={}", value_text(value)))
            .collect();
        Some(pairs.join("; "))
    }
}

/// Default auth-data path, creating the parent directory if needed.
pub fn auth_data_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.place_config_file("auth_data.json")?)
}

/// File-backed auth data. Every save replaces the file wholesale.
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(auth_data_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `data`.
    pub fn save(&self, data: &AuthData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(data).context("serialize auth data")?;
        fs::write(&self.path, json)
            .with_context(|| format!("write auth data: {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "auth data saved");
        Ok(())
    }

    /// Read the file. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<AuthData>> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read auth data: {}", self.path.display()))
            }
        };
        let data: AuthData = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse auth data: {}", self.path.display()))?;
        Ok(Some(data))
    }
}

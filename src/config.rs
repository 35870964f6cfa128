// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration for heartbeatctl
//!
//! Optional settings live in ~/.heartbeatctl/config.json. The API key is
//! normally supplied through the `HEARTBEATCTL_TOKEN` environment variable,
//! which takes precedence over the file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::heartbeat::DEFAULT_API_URL;

/// Environment variable holding the OpsGenie API key
pub const TOKEN_ENV: &str = "HEARTBEATCTL_TOKEN";

/// Get the base heartbeatctl directory (~/.heartbeatctl/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".heartbeatctl"))
        .context("Could not determine home directory")
}

/// heartbeatctl configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// API base URL, defaults to the public OpsGenie endpoint
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,
}

/// Effective connection settings after applying overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path (~/.heartbeatctl/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }

    /// Combine file values with command line and environment overrides
    ///
    /// `token` is the value of [`TOKEN_ENV`], if set. Empty values count as
    /// unset.
    pub fn resolve(self, api_url: Option<String>, token: Option<String>) -> Result<Settings> {
        let api_key = token
            .filter(|t| !t.is_empty())
            .or(self.api_key.filter(|k| !k.is_empty()));
        let Some(api_key) = api_key else {
            bail!("{} cannot be empty", TOKEN_ENV);
        };

        let api_url = api_url
            .or(self.api_url)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Settings { api_url, api_key })
    }
}

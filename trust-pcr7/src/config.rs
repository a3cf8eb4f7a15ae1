// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::Figment;
use load_config::load_config;
use serde::{Deserialize, Serialize};

use crate::KeyStore;

pub const DEFAULT_CONFIG: &str = include_str!("../trust.toml");

pub fn load_config_figment(config_file: Option<&str>) -> Figment {
    load_config("trust", DEFAULT_CONFIG, config_file)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrustConfig {
    /// Overrides the default `<data dir>/machine/trust/keys`.
    #[serde(default)]
    pub keys_dir: Option<PathBuf>,
}

impl TrustConfig {
    pub fn load(config_file: Option<&str>) -> Result<Self> {
        if let Some(path) = config_file {
            if !Path::new(path).exists() {
                bail!("Config file not found: {path}");
            }
        }
        load_config_figment(config_file)
            .extract()
            .context("Failed to load configuration")
    }

    pub fn keys_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.keys_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir().context("Unable to determine the user data directory")?;
        Ok(data_dir.join("machine").join("trust").join("keys"))
    }
}

/// The configured trust root. Configuration is read on every lookup so
/// nothing touches the filesystem before a keyset is actually resolved.
#[derive(Debug, Clone, Default)]
pub struct TrustRoot {
    config_file: Option<String>,
}

impl TrustRoot {
    pub fn new(config_file: Option<String>) -> Self {
        Self { config_file }
    }
}

impl KeyStore for TrustRoot {
    fn trust_dir(&self) -> Result<PathBuf> {
        TrustConfig::load(self.config_file.as_deref())?.keys_dir()
    }
}

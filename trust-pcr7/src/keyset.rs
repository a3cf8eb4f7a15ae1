// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use log::debug;

use crate::{Error, Result};

/// Locates keysets on disk.
pub trait KeyStore {
    /// Directory holding one entry per keyset.
    fn trust_dir(&self) -> anyhow::Result<PathBuf>;

    /// Existence only, no type or permission checks.
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl<T: KeyStore + ?Sized> KeyStore for &T {
    fn trust_dir(&self) -> anyhow::Result<PathBuf> {
        (**self).trust_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// A keyset name together with the path it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetReference {
    name: String,
    path: PathBuf,
}

impl KeysetReference {
    pub fn resolve(store: &impl KeyStore, name: &str) -> Result<Self> {
        let trust_dir = store.trust_dir().map_err(Error::Configuration)?;
        let path = trust_dir.join(name);
        debug!("looking up keyset {name} at {}", path.display());
        if !store.exists(&path) {
            return Err(Error::KeysetNotFound {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

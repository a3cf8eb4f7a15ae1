// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the `computePCR7` command. Every variant is terminal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidUsage(&'static str),
    #[error("Failed to determine the trust root directory")]
    Configuration(#[source] anyhow::Error),
    #[error("Keyset not found: {name}")]
    KeysetNotFound { name: String },
    #[error("Failed to generate pcr7 values for {keyset} keyset")]
    ComputationFailed {
        keyset: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed writing to {}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed writing to buffer")]
    Internal(#[source] io::Error),
}

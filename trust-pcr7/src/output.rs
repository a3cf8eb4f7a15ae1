// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::fs::{OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use log::debug;

use crate::{Error, Result};

/// Mode of report files: owner rw, group r.
pub const REPORT_FILE_MODE: u32 = 0o640;

/// Where the finished report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
}

impl Sink {
    /// An absent or empty path selects standard output.
    pub fn from_output(output: Option<&Path>) -> Self {
        match output {
            Some(path) if !path.as_os_str().is_empty() => Sink::File(path.to_path_buf()),
            _ => Sink::Stdout,
        }
    }

    pub fn deliver(&self, report: &[u8], stdout: &mut dyn Write) -> Result<()> {
        match self {
            Sink::Stdout => stdout
                .write_all(report)
                .and_then(|_| stdout.flush())
                .map_err(|source| Error::WriteFailed {
                    path: "<stdout>".into(),
                    source,
                }),
            Sink::File(path) => {
                debug!("writing report to {}", path.display());
                write_report_file(path, report).map_err(|source| Error::WriteFailed {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Truncates and rewrites `path` in place, creating it with mode 0640 when
/// absent. Hardlinks and symlinks keep pointing at the report. The whole
/// buffer goes out in a single `write_all`.
fn write_report_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(REPORT_FILE_MODE)
        .open(path)?;
    let regular = file.metadata()?.is_file();
    if regular {
        file.set_permissions(Permissions::from_mode(REPORT_FILE_MODE))?;
    }
    file.write_all(contents)?;
    if regular {
        file.sync_all()?;
    }
    Ok(())
}

// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! Precompute the PCR7 values a secure boot keyset will produce.
//!
//! The `computePCR7` command resolves a keyset under the trust root, asks a
//! [`ComputePcr7`] service for the three UKI variants of PCR7 and renders them
//! as a small text report.

pub use command::ComputePcr7Options;
pub use config::{TrustConfig, TrustRoot};
pub use error::{Error, Result};
pub use keyset::{KeyStore, KeysetReference};
pub use output::Sink;
pub use pcr7::{ComputePcr7, KeysetPcr7, Pcr7Data, UkiVariant};
pub use report::assemble;

mod command;
mod config;
mod efi;
mod error;
mod keyset;
mod output;
mod pcr7;
mod report;

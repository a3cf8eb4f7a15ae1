// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::io::{self, Write};

use crate::{Error, Pcr7Data, Result, UkiVariant};

/// Renders the report: the raw event trace when `include_events` is set,
/// then one `<label>: <hex>` line per UKI variant.
pub fn assemble(data: &Pcr7Data, include_events: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_report(&mut buf, data, include_events).map_err(Error::Internal)?;
    Ok(buf)
}

fn write_report(w: &mut impl Write, data: &Pcr7Data, include_events: bool) -> io::Result<()> {
    if include_events {
        w.write_all(&data.events)?;
    }
    for (variant, digest) in [
        (UkiVariant::Production, &data.production),
        (UkiVariant::Limited, &data.limited),
        (UkiVariant::Tpm, &data.tpm),
    ] {
        writeln!(w, "{}: {}", variant.label(), hex::encode(digest))?;
    }
    Ok(())
}

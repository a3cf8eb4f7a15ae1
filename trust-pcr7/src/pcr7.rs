// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use fs_err as fs;
use log::{debug, trace};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::efi::{
    measure_sha256, signature_data, variable_data, x509_signature_list, EventType,
    EFI_GLOBAL_VARIABLE, EFI_IMAGE_SECURITY_DATABASE,
};
use crate::KeyStore;

const PCR_INIT_VALUE: [u8; 32] = [0u8; 32];

/// PCR7 values for the three UKI signing keys of a keyset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pcr7Data {
    /// Human readable trace of the replayed events.
    pub events: Vec<u8>,
    pub production: Vec<u8>,
    pub limited: Vec<u8>,
    pub tpm: Vec<u8>,
}

pub trait ComputePcr7 {
    fn compute_pcr7(&self, keyset: &str) -> Result<Pcr7Data>;
}

impl<T: ComputePcr7 + ?Sized> ComputePcr7 for &T {
    fn compute_pcr7(&self, keyset: &str) -> Result<Pcr7Data> {
        (**self).compute_pcr7(keyset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UkiVariant {
    Production,
    Limited,
    Tpm,
}

impl UkiVariant {
    pub const ALL: [UkiVariant; 3] = [
        UkiVariant::Production,
        UkiVariant::Limited,
        UkiVariant::Tpm,
    ];

    /// Report label, also the keyset sub-directory of the signing cert.
    pub fn label(self) -> &'static str {
        match self {
            UkiVariant::Production => "uki-production",
            UkiVariant::Limited => "uki-limited",
            UkiVariant::Tpm => "uki-tpm",
        }
    }
}

#[derive(Debug, Clone)]
struct Pcr7Event {
    event_type: EventType,
    name: &'static str,
    digest: Vec<u8>,
}

impl Pcr7Event {
    fn variable(event_type: EventType, vendor: &Uuid, name: &'static str, data: &[u8]) -> Self {
        Self {
            event_type,
            name,
            digest: measure_sha256(&variable_data(vendor, name, data)),
        }
    }

    fn separator() -> Self {
        Self {
            event_type: EventType::Separator,
            name: "separator",
            digest: measure_sha256(&[0x00, 0x00, 0x00, 0x00]),
        }
    }
}

fn replay(events: &[Pcr7Event]) -> Vec<u8> {
    events.iter().fold(PCR_INIT_VALUE.to_vec(), |pcr, event| {
        let mut h = Sha256::new();
        h.update(&pcr);
        h.update(&event.digest);
        h.finalize().to_vec()
    })
}

fn read_cert(path: &Path) -> Result<Vec<u8>> {
    let pem_data = fs::read(path)?;
    let (_, pem) = x509_parser::pem::parse_x509_pem(&pem_data)
        .map_err(|e| anyhow!("Invalid PEM in {}: {e:?}", path.display()))?;
    if pem.label != "CERTIFICATE" {
        bail!("{} holds a {}, not a certificate", path.display(), pem.label);
    }
    pem.parse_x509()
        .map_err(|e| anyhow!("Invalid certificate in {}: {e:?}", path.display()))?;
    Ok(pem.contents)
}

/// Certificates of a keyset that end up in the secure boot variables.
#[derive(Debug)]
struct KeysetCerts {
    owner: Uuid,
    pk: Vec<u8>,
    kek: Vec<u8>,
    uki: [Vec<u8>; 3],
}

impl KeysetCerts {
    fn load(dir: &Path) -> Result<Self> {
        let guid_path = dir.join("guid");
        let owner = fs::read_to_string(&guid_path)?;
        let owner = Uuid::parse_str(owner.trim())
            .with_context(|| format!("Invalid owner GUID in {}", guid_path.display()))?;
        let cert = |name: &str| read_cert(&dir.join(name).join("cert.pem"));
        Ok(Self {
            owner,
            pk: cert("uefi-pk")?,
            kek: cert("uefi-kek")?,
            uki: [
                cert(UkiVariant::Production.label())?,
                cert(UkiVariant::Limited.label())?,
                cert(UkiVariant::Tpm.label())?,
            ],
        })
    }

    fn uki_cert(&self, variant: UkiVariant) -> &[u8] {
        match variant {
            UkiVariant::Production => &self.uki[0],
            UkiVariant::Limited => &self.uki[1],
            UkiVariant::Tpm => &self.uki[2],
        }
    }

    fn db(&self) -> Vec<u8> {
        self.uki
            .iter()
            .flat_map(|cert| x509_signature_list(&self.owner, cert))
            .collect()
    }

    /// Events measured when a UKI signed by `variant` is verified against db.
    fn event_log(&self, variant: UkiVariant) -> Vec<Pcr7Event> {
        use EventType::{EfiVariableAuthority, EfiVariableDriverConfig};
        let authority = signature_data(&self.owner, self.uki_cert(variant));
        vec![
            Pcr7Event::variable(
                EfiVariableDriverConfig,
                &EFI_GLOBAL_VARIABLE,
                "SecureBoot",
                &[1],
            ),
            Pcr7Event::variable(
                EfiVariableDriverConfig,
                &EFI_GLOBAL_VARIABLE,
                "PK",
                &x509_signature_list(&self.owner, &self.pk),
            ),
            Pcr7Event::variable(
                EfiVariableDriverConfig,
                &EFI_GLOBAL_VARIABLE,
                "KEK",
                &x509_signature_list(&self.owner, &self.kek),
            ),
            Pcr7Event::variable(
                EfiVariableDriverConfig,
                &EFI_IMAGE_SECURITY_DATABASE,
                "db",
                &self.db(),
            ),
            Pcr7Event::variable(
                EfiVariableDriverConfig,
                &EFI_IMAGE_SECURITY_DATABASE,
                "dbx",
                &[],
            ),
            Pcr7Event::separator(),
            Pcr7Event::variable(
                EfiVariableAuthority,
                &EFI_IMAGE_SECURITY_DATABASE,
                "db",
                &authority,
            ),
        ]
    }
}

/// Replays the secure boot measurements of a keyset stored under the trust root.
#[derive(Debug, Clone)]
pub struct KeysetPcr7<S> {
    store: S,
}

impl<S: KeyStore> KeysetPcr7<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyStore> ComputePcr7 for KeysetPcr7<S> {
    fn compute_pcr7(&self, keyset: &str) -> Result<Pcr7Data> {
        let dir = self.store.trust_dir()?.join(keyset);
        debug!("computing pcr7 for keyset at {}", dir.display());
        let certs = KeysetCerts::load(&dir)?;

        let mut events = Vec::new();
        let mut values = Vec::with_capacity(UkiVariant::ALL.len());
        for variant in UkiVariant::ALL {
            let log = certs.event_log(variant);
            writeln!(events, "{} events:", variant.label())?;
            for (index, event) in log.iter().enumerate() {
                let digest = hex::encode(&event.digest);
                trace!(
                    "{}[{index}] {} {} {digest}",
                    variant.label(),
                    event.event_type,
                    event.name
                );
                writeln!(events, "  {index} {} {} {digest}", event.event_type, event.name)?;
            }
            values.push(replay(&log));
        }

        let [production, limited, tpm]: [Vec<u8>; 3] = values
            .try_into()
            .map_err(|_| anyhow!("Expected one pcr7 value per uki variant"))?;
        Ok(Pcr7Data {
            events,
            production,
            limited,
            tpm,
        })
    }
}

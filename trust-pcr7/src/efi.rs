// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

//! UEFI structures measured into PCR7.

use std::fmt;

use sha2::{Digest, Sha256};
use uuid::{uuid, Uuid};

pub const EFI_GLOBAL_VARIABLE: Uuid = uuid!("8be4df61-93ca-11d2-aa0d-00e098032b8c");
pub const EFI_IMAGE_SECURITY_DATABASE: Uuid = uuid!("d719b2cb-3d3a-4596-a3bc-dad00e67656f");
pub const EFI_CERT_X509: Uuid = uuid!("a5c059a1-94e4-4aa7-87b5-ab155c2bf072");

const SIGNATURE_LIST_HEADER_SIZE: usize = 28;

/// TCG event types that contribute to PCR7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EventType {
    Separator = 0x0000_0004,
    EfiVariableDriverConfig = 0x8000_0001,
    EfiVariableAuthority = 0x8000_00e0,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventType::Separator => "EV_SEPARATOR",
            EventType::EfiVariableDriverConfig => "EV_EFI_VARIABLE_DRIVER_CONFIG",
            EventType::EfiVariableAuthority => "EV_EFI_VARIABLE_AUTHORITY",
        })
    }
}

/// GUIDs are stored with the first three fields little-endian.
pub fn encode_guid(guid: &Uuid) -> [u8; 16] {
    guid.to_bytes_le()
}

pub fn utf16_encode(input: &str) -> Vec<u8> {
    input.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}

/// `EFI_SIGNATURE_DATA`: owner GUID followed by the signature payload.
pub fn signature_data(owner: &Uuid, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(16 + payload.len());
    data.extend_from_slice(&encode_guid(owner));
    data.extend_from_slice(payload);
    data
}

/// `EFI_SIGNATURE_LIST` holding a single X.509 certificate.
pub fn x509_signature_list(owner: &Uuid, cert_der: &[u8]) -> Vec<u8> {
    let entry = signature_data(owner, cert_der);
    let list_size = SIGNATURE_LIST_HEADER_SIZE + entry.len();

    let mut list = Vec::with_capacity(list_size);
    list.extend_from_slice(&encode_guid(&EFI_CERT_X509));
    list.extend_from_slice(&(list_size as u32).to_le_bytes());
    list.extend_from_slice(&0u32.to_le_bytes()); // SignatureHeaderSize
    list.extend_from_slice(&(entry.len() as u32).to_le_bytes());
    list.extend_from_slice(&entry);
    list
}

/// `UEFI_VARIABLE_DATA` as logged for variable events.
pub fn variable_data(vendor: &Uuid, name: &str, data: &[u8]) -> Vec<u8> {
    let name_units = name.encode_utf16().count() as u64;
    let mut out = Vec::new();
    out.extend_from_slice(&encode_guid(vendor));
    out.extend_from_slice(&name_units.to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend(utf16_encode(name));
    out.extend_from_slice(data);
    out
}

pub fn measure_sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_guid_mixed_endian_layout() {
        assert_eq!(
            encode_guid(&EFI_GLOBAL_VARIABLE),
            hex!("61dfe48bca93d211aa0d00e098032b8c")
        );
        assert_eq!(
            encode_guid(&EFI_IMAGE_SECURITY_DATABASE),
            hex!("cbb219d73a3d9645a3bcdad00e67656f")
        );
    }

    #[test]
    fn test_utf16_encode() {
        assert_eq!(utf16_encode("PK"), vec![b'P', 0, b'K', 0]);
    }

    #[test]
    fn test_variable_data_layout() {
        let data = variable_data(&EFI_GLOBAL_VARIABLE, "SecureBoot", &[1]);
        assert_eq!(data.len(), 16 + 8 + 8 + 20 + 1);
        assert_eq!(&data[16..24], &10u64.to_le_bytes());
        assert_eq!(&data[24..32], &1u64.to_le_bytes());
        assert_eq!(&data[32..34], &[b'S', 0]);
        assert_eq!(data.last(), Some(&1));
    }

    #[test]
    fn test_empty_variable() {
        let data = variable_data(&EFI_IMAGE_SECURITY_DATABASE, "dbx", &[]);
        assert_eq!(data.len(), 16 + 8 + 8 + 6);
        assert_eq!(&data[24..32], &0u64.to_le_bytes());
    }

    #[test]
    fn test_signature_list_sizes() {
        let owner = uuid!("11111111-2222-3333-4444-555555555555");
        let der = [0xabu8; 100];
        let list = x509_signature_list(&owner, &der);

        assert_eq!(list.len(), 28 + 16 + 100);
        assert_eq!(&list[..16], &encode_guid(&EFI_CERT_X509));
        assert_eq!(&list[16..20], &(144u32).to_le_bytes());
        assert_eq!(&list[20..24], &0u32.to_le_bytes());
        assert_eq!(&list[24..28], &(116u32).to_le_bytes());
        assert_eq!(&list[28..44], &encode_guid(&owner));
        assert_eq!(&list[44..], &der);
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::Separator.to_string(), "EV_SEPARATOR");
        assert_eq!(EventType::EfiVariableAuthority as u32, 0x800000e0);
    }
}

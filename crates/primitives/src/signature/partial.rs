//! Resumable encoding of an incomplete signature aggregate.
//!
//! A partial aggregate travels between signing sessions as
//! `abi.encode((address signer, bytes data, bool dynamic)[])`. Blobs produced before the
//! `dynamic` flag existed carry `(address signer, bytes data)[]` and are still accepted;
//! every entry of such a blob is treated as a static ECDSA slot.

use super::proof::{ECDSA_SIGNATURE_LENGTH, Proof, ProofData};
use alloy_primitives::{Bytes, FixedBytes};
use alloy_sol_types::{SolValue, sol};

sol! {
    /// Current partial-signature entry.
    #[derive(Debug, PartialEq, Eq)]
    struct SignatureEntry {
        address signer;
        bytes data;
        bool dynamic;
    }

    /// Entry shape of blobs written before contract signatures were supported.
    #[derive(Debug, PartialEq, Eq)]
    struct LegacySignatureEntry {
        address signer;
        bytes data;
    }
}

/// Failure to read a partial blob in either supported shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartialDecodeError {
    #[error("blob is neither a current nor a legacy partial signature")]
    UnknownShape,
    #[error("static entry for {signer} is {len} bytes, expected {ECDSA_SIGNATURE_LENGTH}")]
    InvalidStaticLength {
        signer: alloy_primitives::Address,
        len: usize,
    },
}

impl From<&Proof> for SignatureEntry {
    fn from(proof: &Proof) -> Self {
        Self {
            signer: proof.signer,
            data: Bytes::copy_from_slice(proof.data.as_bytes()),
            dynamic: proof.data.is_dynamic(),
        }
    }
}

impl TryFrom<SignatureEntry> for Proof {
    type Error = PartialDecodeError;

    fn try_from(entry: SignatureEntry) -> Result<Self, Self::Error> {
        if entry.dynamic {
            return Ok(Self::dynamic(entry.signer, entry.data));
        }
        let sig = FixedBytes::<ECDSA_SIGNATURE_LENGTH>::try_from(entry.data.as_ref()).map_err(
            |_| PartialDecodeError::InvalidStaticLength {
                signer: entry.signer,
                len: entry.data.len(),
            },
        )?;
        Ok(Self {
            signer: entry.signer,
            data: ProofData::Static(sig),
        })
    }
}

impl From<LegacySignatureEntry> for SignatureEntry {
    fn from(entry: LegacySignatureEntry) -> Self {
        Self {
            signer: entry.signer,
            data: entry.data,
            dynamic: false,
        }
    }
}

/// Encode proofs in the given order as a partial blob.
pub fn encode_partial<'a>(proofs: impl IntoIterator<Item = &'a Proof>) -> Bytes {
    let entries: Vec<SignatureEntry> = proofs.into_iter().map(SignatureEntry::from).collect();
    entries.abi_encode().into()
}

/// Decode a partial blob, trying the current shape first and the legacy shape second.
///
/// A shape only matches when re-encoding the decoded entries reproduces the input
/// exactly, so a legacy blob can never be misread as a current one.
pub fn decode_partial(blob: &[u8]) -> Result<Vec<Proof>, PartialDecodeError> {
    let entries = decode_current(blob)
        .or_else(|| {
            decode_legacy(blob).map(|legacy| legacy.into_iter().map(SignatureEntry::from).collect())
        })
        .ok_or(PartialDecodeError::UnknownShape)?;

    entries.into_iter().map(Proof::try_from).collect()
}

fn decode_current(blob: &[u8]) -> Option<Vec<SignatureEntry>> {
    let decoded = Vec::<SignatureEntry>::abi_decode(blob).ok()?;
    (decoded.abi_encode() == blob).then_some(decoded)
}

fn decode_legacy(blob: &[u8]) -> Option<Vec<LegacySignatureEntry>> {
    let decoded = Vec::<LegacySignatureEntry>::abi_decode(blob).ok()?;
    (decoded.abi_encode() == blob).then_some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn static_proof(byte: u8) -> Proof {
        let mut sig = [byte; ECDSA_SIGNATURE_LENGTH];
        sig[64] = 27;
        Proof {
            signer: Address::repeat_byte(byte),
            data: ProofData::Static(sig.into()),
        }
    }

    #[test]
    fn test_partial_roundtrip_keeps_dynamic_flag() {
        let proofs = vec![
            static_proof(0x01),
            Proof::dynamic(Address::repeat_byte(0x02), vec![0xc0, 0xff, 0xee]),
        ];

        let blob = encode_partial(&proofs);
        assert_eq!(decode_partial(&blob).unwrap(), proofs);
    }

    #[test]
    fn test_empty_partial() {
        let blob = encode_partial(&[]);
        // offset word + zero length
        assert_eq!(blob.len(), 64);
        assert!(decode_partial(&blob).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_partial_defaults_to_static() {
        let legacy = vec![
            LegacySignatureEntry {
                signer: Address::repeat_byte(0x0a),
                data: Bytes::from(vec![0x0a; ECDSA_SIGNATURE_LENGTH]),
            },
            LegacySignatureEntry {
                signer: Address::repeat_byte(0x0b),
                data: Bytes::from(vec![0x0b; ECDSA_SIGNATURE_LENGTH]),
            },
        ];
        let blob = legacy.abi_encode();

        // The current shape must not accept it.
        assert!(decode_current(&blob).is_none());

        let proofs = decode_partial(&blob).unwrap();
        assert_eq!(proofs.len(), 2);
        for (proof, entry) in proofs.iter().zip(&legacy) {
            assert_eq!(proof.signer, entry.signer);
            assert!(!proof.data.is_dynamic());
            assert_eq!(proof.data.as_bytes(), entry.data.as_ref());
        }
    }

    #[test]
    fn test_legacy_entry_with_wrong_length_is_rejected() {
        let blob = vec![LegacySignatureEntry {
            signer: Address::repeat_byte(0x0a),
            data: Bytes::from_static(&[0u8; 10]),
        }]
        .abi_encode();

        assert_eq!(
            decode_partial(&blob),
            Err(PartialDecodeError::InvalidStaticLength {
                signer: Address::repeat_byte(0x0a),
                len: 10
            })
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(decode_partial(&[0xde, 0xad]), Err(PartialDecodeError::UnknownShape));
        assert_eq!(decode_partial(&[]), Err(PartialDecodeError::UnknownShape));
    }
}

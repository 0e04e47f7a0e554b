use super::{
    partial::{PartialDecodeError, decode_partial, encode_partial},
    proof::{ECDSA_SIGNATURE_LENGTH, Proof, ProofData, ProofError, recover_signer},
};
use crate::operation::{OperationError, ValidityWindow};
use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256};
use std::collections::{BTreeMap, btree_map::Entry};
use tracing::debug;

/// Errors raised while merging, packing or unpacking owner proofs.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Partial(#[from] PartialDecodeError),
    #[error("malformed packed signature: {0}")]
    Packed(&'static str),
    #[error("signer {0} appears more than once")]
    DuplicateSigner(Address),
    #[error("signers are not in ascending order at {0}")]
    UnorderedSigners(Address),
    #[error("{collected} proofs collected for {owners} owners")]
    TooManyProofs { collected: usize, owners: usize },
    #[error("{collected} proofs collected, {required} required")]
    UnderThreshold { collected: usize, required: usize },
    #[error(transparent)]
    Proof(#[from] ProofError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Progress of an aggregate towards the owner count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum AggregateState {
    #[display("empty")]
    Empty,
    #[display("accumulating ({collected}/{required})")]
    Accumulating { collected: usize, required: usize },
    #[display("complete")]
    Complete,
}

/// Signature produced by a signing round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregatedSignature {
    /// Resumable tuple encoding; hand it to the next signer.
    Partial(Bytes),
    /// Packed blob ready for the user operation `signature` field.
    Final(Bytes),
}

impl AggregatedSignature {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Partial(bytes) | Self::Final(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Partial(bytes) | Self::Final(bytes) => bytes,
        }
    }
}

/// Owner proofs keyed by signer address.
///
/// The map keeps signers in ascending byte order, which is the order the Safe verifier
/// walks owners in, so every encoding derived from it is canonical regardless of the
/// order proofs were collected in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureAggregate {
    proofs: BTreeMap<Address, ProofData>,
    owner_count: usize,
}

impl SignatureAggregate {
    pub fn new(owner_count: usize) -> Self {
        Self {
            proofs: BTreeMap::new(),
            owner_count,
        }
    }

    /// Resume from a partial blob.
    pub fn from_partial(blob: &[u8], owner_count: usize) -> Result<Self, AggregateError> {
        let mut proofs = BTreeMap::new();
        for proof in decode_partial(blob)? {
            match proofs.entry(proof.signer) {
                Entry::Vacant(entry) => {
                    entry.insert(proof.data);
                }
                Entry::Occupied(_) => return Err(AggregateError::DuplicateSigner(proof.signer)),
            }
        }
        if proofs.len() > owner_count {
            return Err(AggregateError::TooManyProofs {
                collected: proofs.len(),
                owners: owner_count,
            });
        }
        Ok(Self {
            proofs,
            owner_count,
        })
    }

    /// Aggregate extended by `proof`. A proof from a signer already present replaces it.
    pub fn with_proof(&self, proof: Proof) -> Result<Self, AggregateError> {
        let mut next = self.clone();
        next.proofs.insert(proof.signer, proof.data);
        if next.proofs.len() > next.owner_count {
            return Err(AggregateError::TooManyProofs {
                collected: next.proofs.len(),
                owners: next.owner_count,
            });
        }
        debug!(signer = %proof.signer, state = %next.state(), "added proof");
        Ok(next)
    }

    pub fn owner_count(&self) -> usize {
        self.owner_count
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.proofs.len() == self.owner_count
    }

    pub fn contains(&self, signer: &Address) -> bool {
        self.proofs.contains_key(signer)
    }

    pub fn state(&self) -> AggregateState {
        match self.proofs.len() {
            0 if self.owner_count > 0 => AggregateState::Empty,
            n if n == self.owner_count => AggregateState::Complete,
            collected => AggregateState::Accumulating {
                collected,
                required: self.owner_count,
            },
        }
    }

    /// Signers in canonical order.
    pub fn signers(&self) -> impl Iterator<Item = &Address> {
        self.proofs.keys()
    }

    /// Proofs in canonical order.
    pub fn proofs(&self) -> impl Iterator<Item = Proof> + '_ {
        self.proofs.iter().map(|(signer, data)| Proof {
            signer: *signer,
            data: data.clone(),
        })
    }

    /// `abi.encode((address,bytes,bool)[])` of the proofs in canonical order.
    pub fn encode_partial(&self) -> Bytes {
        encode_partial(&self.proofs().collect::<Vec<_>>())
    }

    /// Pack the proofs into the on-chain layout. Only a complete aggregate packs.
    pub fn pack(&self, validity: ValidityWindow) -> Result<Bytes, AggregateError> {
        self.finalize(self.owner_count, validity)
    }

    /// Pack once at least `threshold` proofs are present.
    pub fn finalize(
        &self,
        threshold: usize,
        validity: ValidityWindow,
    ) -> Result<Bytes, AggregateError> {
        if self.proofs.len() < threshold || self.proofs.is_empty() {
            return Err(AggregateError::UnderThreshold {
                collected: self.proofs.len(),
                required: threshold.max(1),
            });
        }
        let mut out = validity.encode()?.to_vec();
        out.extend_from_slice(&self.encode_signatures());
        Ok(out.into())
    }

    /// Static slots followed by the dynamic region, without the validity prefix.
    ///
    /// Each static slot is 65 bytes. Contract signatures occupy
    /// `uint256(signer) ++ uint256(offset) ++ 0x00` and point into the dynamic region,
    /// with offsets measured from the start of the static region.
    pub fn encode_signatures(&self) -> Bytes {
        let static_len = self.proofs.len() * ECDSA_SIGNATURE_LENGTH;
        let mut static_part = Vec::with_capacity(static_len);
        let mut dynamic_part = Vec::new();

        for (signer, data) in &self.proofs {
            match data {
                ProofData::Static(sig) => static_part.extend_from_slice(sig.as_slice()),
                ProofData::Dynamic(bytes) => {
                    let offset = U256::from(static_len + dynamic_part.len());
                    static_part.extend_from_slice(signer.into_word().as_slice());
                    static_part.extend_from_slice(&offset.to_be_bytes::<32>());
                    static_part.push(0);

                    dynamic_part.extend_from_slice(&U256::from(bytes.len()).to_be_bytes::<32>());
                    dynamic_part.extend_from_slice(bytes);
                }
            }
        }

        static_part.extend_from_slice(&dynamic_part);
        static_part.into()
    }

    /// Partial encoding while incomplete, packed form once every owner has signed.
    pub fn into_signature(self, validity: ValidityWindow) -> Result<AggregatedSignature, AggregateError> {
        if self.is_complete() && !self.is_empty() {
            self.pack(validity).map(AggregatedSignature::Final)
        } else {
            Ok(AggregatedSignature::Partial(self.encode_partial()))
        }
    }

    /// Recover the proofs of a packed signature.
    ///
    /// ECDSA slots are attributed by recovering the signer from `digest`; contract slots
    /// carry the signer and point at their data.
    pub fn unpack(
        blob: &[u8],
        owner_count: usize,
        digest: B256,
    ) -> Result<(ValidityWindow, Self), AggregateError> {
        let validity = ValidityWindow::decode(blob)
            .ok_or(AggregateError::Packed("missing validity window"))?;
        let signatures = &blob[ValidityWindow::ENCODED_LENGTH..];
        let static_len = owner_count
            .checked_mul(ECDSA_SIGNATURE_LENGTH)
            .ok_or(AggregateError::Packed("owner count out of range"))?;
        if owner_count == 0 || signatures.len() < static_len {
            return Err(AggregateError::Packed("shorter than the static region"));
        }

        let mut proofs = BTreeMap::new();
        let mut previous: Option<Address> = None;
        for slot in signatures[..static_len].chunks_exact(ECDSA_SIGNATURE_LENGTH) {
            let slot = FixedBytes::<ECDSA_SIGNATURE_LENGTH>::try_from(slot)
                .map_err(|_| AggregateError::Packed("truncated slot"))?;
            let (signer, data) = match slot[64] {
                0 => {
                    let signer = Address::from_word(B256::from_slice(&slot[..32]));
                    let data = read_dynamic(signatures, &slot[32..64])?;
                    (signer, ProofData::Dynamic(data))
                }
                _ => (recover_signer(&slot, digest)?, ProofData::Static(slot)),
            };

            match previous {
                Some(prev) if prev == signer => return Err(AggregateError::DuplicateSigner(signer)),
                Some(prev) if prev > signer => return Err(AggregateError::UnorderedSigners(signer)),
                _ => {}
            }
            previous = Some(signer);
            proofs.insert(signer, data);
        }

        Ok((
            validity,
            Self {
                proofs,
                owner_count,
            },
        ))
    }
}

fn read_dynamic(signatures: &[u8], offset_word: &[u8]) -> Result<Bytes, AggregateError> {
    let offset = usize::try_from(U256::from_be_slice(offset_word))
        .map_err(|_| AggregateError::Packed("offset out of range"))?;
    let len_end = offset
        .checked_add(32)
        .filter(|end| *end <= signatures.len())
        .ok_or(AggregateError::Packed("offset out of range"))?;
    let len = usize::try_from(U256::from_be_slice(&signatures[offset..len_end]))
        .map_err(|_| AggregateError::Packed("length out of range"))?;
    let data_end = len_end
        .checked_add(len)
        .filter(|end| *end <= signatures.len())
        .ok_or(AggregateError::Packed("contract signature out of range"))?;
    Ok(Bytes::copy_from_slice(&signatures[len_end..data_end]))
}

/// Merge an optional previous partial blob and an optional new proof.
pub fn aggregate(
    existing_partial: Option<&[u8]>,
    new_proof: Option<Proof>,
    owner_count: usize,
) -> Result<SignatureAggregate, AggregateError> {
    let aggregate = match existing_partial {
        Some(blob) => SignatureAggregate::from_partial(blob, owner_count)?,
        None => SignatureAggregate::new(owner_count),
    };
    match new_proof {
        Some(proof) => aggregate.with_proof(proof),
        None => Ok(aggregate),
    }
}

use alloy_primitives::{Address, B256, Bytes, FixedBytes, Signature, SignatureError, eip191_hash_message};

/// Length of an ECDSA signature slot: `r ++ s ++ v`.
pub const ECDSA_SIGNATURE_LENGTH: usize = 65;

/// Offset added to `v` when the digest was signed with the EIP-191 personal-message
/// prefix. The Safe verifier treats `v > 30` as "re-apply the prefix before recovery".
pub const ETH_SIGN_V_OFFSET: u8 = 4;

/// How an owner's key signed the SafeOp digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SigningMethod {
    /// The digest itself was signed (EIP-712 typed data or raw hash).
    #[default]
    TypedData,
    /// The digest was signed as an EIP-191 personal message.
    PersonalSign,
}

/// Errors raised while building or checking an individual owner proof.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("signature must be {ECDSA_SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("unsupported recovery byte {0}")]
    InvalidRecoveryByte(u8),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Payload of an owner proof.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProofData {
    /// ECDSA signature with a Safe-normalized recovery byte, packed in place.
    Static(FixedBytes<ECDSA_SIGNATURE_LENGTH>),
    /// Contract signature (ERC-1271), appended after the static slots.
    Dynamic(Bytes),
}

impl ProofData {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Static(sig) => sig.as_slice(),
            Self::Dynamic(data) => data,
        }
    }
}

/// A single owner's contribution to an aggregate signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Proof {
    /// On-chain owner address the proof is attributed to.
    pub signer: Address,
    pub data: ProofData,
}

impl Proof {
    /// Contract-signature proof, e.g. a WebAuthn assertion checked by the shared signer.
    pub fn dynamic(signer: Address, data: impl Into<Bytes>) -> Self {
        Self {
            signer,
            data: ProofData::Dynamic(data.into()),
        }
    }

    /// ECDSA proof from a parsed signature.
    pub fn ecdsa(signer: Address, signature: &Signature, method: SigningMethod) -> Self {
        let mut raw = signature.as_bytes();
        raw[64] = safe_recovery_byte(signature.v(), method);
        Self {
            signer,
            data: ProofData::Static(raw.into()),
        }
    }

    /// ECDSA proof from 65 raw bytes as returned by an external wallet.
    ///
    /// The trailing byte may be `0/1`, `27/28`, or already offset for personal-sign.
    pub fn from_raw_ecdsa(
        signer: Address,
        raw: &[u8],
        method: SigningMethod,
    ) -> Result<Self, ProofError> {
        let raw: [u8; ECDSA_SIGNATURE_LENGTH] = raw
            .try_into()
            .map_err(|_| ProofError::InvalidLength(raw.len()))?;
        let mut normalized = raw;
        normalized[64] = normalize_recovery_byte(raw[64], method)?;
        Ok(Self {
            signer,
            data: ProofData::Static(normalized.into()),
        })
    }
}

/// Safe recovery byte for a y-parity and signing method.
pub fn safe_recovery_byte(y_parity: bool, method: SigningMethod) -> u8 {
    let v = 27 + y_parity as u8;
    match method {
        SigningMethod::TypedData => v,
        SigningMethod::PersonalSign => v + ETH_SIGN_V_OFFSET,
    }
}

/// Map a wallet-provided recovery byte onto the Safe encoding.
pub fn normalize_recovery_byte(v: u8, method: SigningMethod) -> Result<u8, ProofError> {
    let parity = match v {
        0 | 27 => false,
        1 | 28 => true,
        31 | 32 if method == SigningMethod::PersonalSign => return Ok(v),
        _ => return Err(ProofError::InvalidRecoveryByte(v)),
    };
    Ok(safe_recovery_byte(parity, method))
}

/// Recover the signer of a Safe-encoded ECDSA slot over `digest`.
pub fn recover_signer(
    signature: &FixedBytes<ECDSA_SIGNATURE_LENGTH>,
    digest: B256,
) -> Result<Address, ProofError> {
    let v = signature[64];
    let (v, prehash) = match v {
        27 | 28 => (v, digest),
        31 | 32 => (v - ETH_SIGN_V_OFFSET, eip191_hash_message(digest)),
        _ => return Err(ProofError::InvalidRecoveryByte(v)),
    };

    let mut raw = signature.0;
    raw[64] = v;
    let signature = Signature::from_raw_array(&raw)?;
    Ok(signature.recover_address_from_prehash(&prehash)?)
}

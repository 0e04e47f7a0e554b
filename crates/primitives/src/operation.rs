use alloy_primitives::{Address, Bytes, U256, aliases::U48};
use safe_contracts::EntryPointVersion;

/// Largest value representable in a `uint48` timestamp.
pub const MAX_UINT48: u64 = (1 << 48) - 1;

/// Errors raised while projecting a [`PendingOperation`] onto a versioned layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("`{field}` does not fit the 128-bit field of the {version} layout")]
    GasFieldOverflow {
        field: &'static str,
        version: EntryPointVersion,
    },
    #[error("validity timestamp {0} does not fit in 48 bits")]
    TimestampOverflow(u64),
}

/// `validAfter` / `validUntil` bounds of a Safe operation.
///
/// Both values are unix timestamps held in 48 bits on chain. `valid_until == 0` means
/// the operation never expires. Every constructor, deserialization included, rejects
/// wider values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(rename_all = "camelCase", try_from = "RawValidityWindow")
)]
pub struct ValidityWindow {
    valid_after: u64,
    valid_until: u64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidityWindow {
    #[serde(default)]
    valid_after: u64,
    #[serde(default)]
    valid_until: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawValidityWindow> for ValidityWindow {
    type Error = OperationError;

    fn try_from(raw: RawValidityWindow) -> Result<Self, Self::Error> {
        Self::new(raw.valid_after, raw.valid_until)
    }
}

impl ValidityWindow {
    /// Length of the packed `validAfter ++ validUntil` prefix.
    pub const ENCODED_LENGTH: usize = 12;

    /// Create a window, rejecting timestamps wider than 48 bits.
    pub fn new(valid_after: u64, valid_until: u64) -> Result<Self, OperationError> {
        for value in [valid_after, valid_until] {
            if value > MAX_UINT48 {
                return Err(OperationError::TimestampOverflow(value));
            }
        }
        Ok(Self {
            valid_after,
            valid_until,
        })
    }

    pub const fn valid_after(&self) -> u64 {
        self.valid_after
    }

    pub const fn valid_until(&self) -> u64 {
        self.valid_until
    }

    /// `validAfter` as the `uint48` of the `SafeOp` struct.
    pub fn valid_after_u48(&self) -> Result<U48, OperationError> {
        to_u48(self.valid_after)
    }

    /// `validUntil` as the `uint48` of the `SafeOp` struct.
    pub fn valid_until_u48(&self) -> Result<U48, OperationError> {
        to_u48(self.valid_until)
    }

    /// Packed `uint48 validAfter ++ uint48 validUntil`.
    pub fn encode(&self) -> Result<[u8; Self::ENCODED_LENGTH], OperationError> {
        let mut out = [0u8; Self::ENCODED_LENGTH];
        out[..6].copy_from_slice(&self.valid_after_u48()?.to_be_bytes::<6>());
        out[6..].copy_from_slice(&self.valid_until_u48()?.to_be_bytes::<6>());
        Ok(out)
    }

    /// Decode the packed prefix; returns `None` when fewer than 12 bytes are given.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let prefix = bytes.get(..Self::ENCODED_LENGTH)?;
        let read = |chunk: &[u8]| {
            let mut word = [0u8; 8];
            word[2..].copy_from_slice(chunk);
            u64::from_be_bytes(word)
        };
        Some(Self {
            valid_after: read(&prefix[..6]),
            valid_until: read(&prefix[6..]),
        })
    }
}

fn to_u48(value: u64) -> Result<U48, OperationError> {
    U48::try_from(value).map_err(|_| OperationError::TimestampOverflow(value))
}

/// Entry point an operation is submitted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryPoint {
    pub address: Address,
    pub version: EntryPointVersion,
}

impl EntryPoint {
    /// The canonical deployment of `version`.
    pub const fn canonical(version: EntryPointVersion) -> Self {
        Self {
            address: version.entry_point(),
            version,
        }
    }
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::canonical(EntryPointVersion::default())
    }
}

/// Paymaster sponsoring an operation.
///
/// The `v0.6` layout only carries `address ++ data`; the gas limits are meaningful for
/// `v0.7` only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Paymaster {
    pub address: Address,
    pub verification_gas_limit: U256,
    pub post_op_gas_limit: U256,
    pub data: Bytes,
}

/// A user operation waiting for owner signatures.
///
/// Version-independent: gas fields are held at full width and narrowed when the
/// operation is projected onto the `v0.7` layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PendingOperation {
    /// The Safe account the operation executes on.
    pub sender: Address,
    pub nonce: U256,
    /// Factory for the first operation of a not-yet-deployed account.
    pub factory: Option<Address>,
    pub factory_data: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster: Option<Paymaster>,
    pub validity: ValidityWindow,
    pub entry_point: EntryPoint,
}

impl PendingOperation {
    pub fn version(&self) -> EntryPointVersion {
        self.entry_point.version
    }

    /// `factory ++ factoryData`, empty for deployed accounts.
    pub fn init_code(&self) -> Bytes {
        match self.factory {
            Some(factory) => [factory.as_slice(), self.factory_data.as_ref()]
                .concat()
                .into(),
            None => Bytes::new(),
        }
    }

    /// `paymasterAndData` in the layout of this operation's entry point version.
    ///
    /// - `v0.6`: `paymaster ++ data`
    /// - `v0.7`: `paymaster ++ uint128 verificationGas ++ uint128 postOpGas ++ data`
    pub fn paymaster_and_data(&self) -> Result<Bytes, OperationError> {
        let Some(paymaster) = &self.paymaster else {
            return Ok(Bytes::new());
        };

        let mut out = Vec::with_capacity(20 + 32 + paymaster.data.len());
        out.extend_from_slice(paymaster.address.as_slice());
        if self.version() == EntryPointVersion::V07 {
            let verification = self.narrow("paymasterVerificationGasLimit", paymaster.verification_gas_limit)?;
            let post_op = self.narrow("paymasterPostOpGasLimit", paymaster.post_op_gas_limit)?;
            out.extend_from_slice(&verification.to_be_bytes());
            out.extend_from_slice(&post_op.to_be_bytes());
        }
        out.extend_from_slice(&paymaster.data);
        Ok(out.into())
    }

    /// Narrow a gas field to the 128 bits the `v0.7` layout packs it into.
    pub(crate) fn narrow(&self, field: &'static str, value: U256) -> Result<u128, OperationError> {
        u128::try_from(value).map_err(|_| OperationError::GasFieldOverflow {
            field,
            version: self.version(),
        })
    }
}

//! Canonical Safe v1.4.1 deployments used by the 4337 account flavour.

use alloy_primitives::{Address, address};

/// ERC-4337 entry point `v0.6`.
pub const ENTRY_POINT_V06: Address = address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");
/// ERC-4337 entry point `v0.7`.
pub const ENTRY_POINT_V07: Address = address!("0x0000000071727De22E5E9d8BAf0edAc6f37da032");

pub const SAFE_PROXY_FACTORY_ADDRESS: Address =
    address!("0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67");
pub const SAFE_SINGLETON_ADDRESS: Address = address!("0x41675C099F32341bf84BFc5382aF534df5C7461a");
pub const MULTI_SEND_ADDRESS: Address = address!("0x38869bf66a61cF6bDB996A6aE40D5853Fd43B526");
pub const MULTI_SEND_CALL_ONLY_ADDRESS: Address =
    address!("0x9641d764fc13c8B624c04430C7356C1C7C8102e2");

/// Shared WebAuthn signer; stands in for every passkey owner in the owner list.
pub const WEBAUTHN_SHARED_SIGNER_ADDRESS: Address =
    address!("0x94a4F6affBd8975951142c3999aEAB7ecee555c2");
/// FreshCryptoLib P-256 verifier used as fallback by the shared signer.
pub const P256_VERIFIER_ADDRESS: Address = address!("0xA86e0054C51E4894D88762a017ECc5E5235f5DBA");

/// Safe7579 adapter, installed as fallback handler and 4337 module in launchpad mode.
pub const SAFE_7579_ADAPTER_ADDRESS: Address =
    address!("0x7579EE8307284F293B1927136486880611F20002");
pub const SAFE_7579_LAUNCHPAD_ADDRESS: Address =
    address!("0x7579011aB74c46090561ea277Ba79D510c6C00ff");

/// Entry point generation an account operation targets.
///
/// The two generations disagree on the user operation layout and therefore on the
/// `SafeOp` typed-data schema, so every hashing path must be selected by this value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryPointVersion {
    #[cfg_attr(feature = "serde", serde(rename = "v0.6"))]
    V06,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "v0.7"))]
    V07,
}

impl EntryPointVersion {
    /// Canonical entry point address for this version.
    pub const fn entry_point(self) -> Address {
        match self {
            Self::V06 => ENTRY_POINT_V06,
            Self::V07 => ENTRY_POINT_V07,
        }
    }

    /// Canonical Safe deployment paired with this entry point version.
    pub const fn deployment(self) -> SafeDeployment {
        match self {
            Self::V06 => SafeDeployment {
                safe_4337_module: address!("0xa581c4A4DB7175302464fF3C06380BC3270b4037"),
                safe_module_setup: address!("0x8EcD4ec46D4D2a6B64fE960B3D64e8B94B2234eb"),
                ..SafeDeployment::V1_4_1_BASE
            },
            Self::V07 => SafeDeployment {
                safe_4337_module: address!("0x75cf11467937ce3F2f357CE24ffc3DBF8fD5c226"),
                safe_module_setup: address!("0x2dd68b007B46fBe91B9A7c3EDa5A7a1063cB5b47"),
                ..SafeDeployment::V1_4_1_BASE
            },
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V06 => "v0.6",
            Self::V07 => "v0.7",
        }
    }
}

impl core::fmt::Display for EntryPointVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for EntryPointVersion {
    type Err = UnknownEntryPointVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('v') {
            "0.6" | "06" => Ok(Self::V06),
            "0.7" | "07" => Ok(Self::V07),
            _ => Err(UnknownEntryPointVersion(s.to_string())),
        }
    }
}

/// Error returned when parsing an unsupported entry point version string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEntryPointVersion(pub String);

impl core::fmt::Display for UnknownEntryPointVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unsupported entry point version `{}` (expected v0.6 or v0.7)", self.0)
    }
}

impl core::error::Error for UnknownEntryPointVersion {}

/// Addresses of the contracts a Safe 4337 account is assembled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SafeDeployment {
    pub safe_proxy_factory: Address,
    pub safe_singleton: Address,
    pub safe_4337_module: Address,
    pub safe_module_setup: Address,
    pub multi_send: Address,
    pub multi_send_call_only: Address,
    pub webauthn_shared_signer: Address,
    pub p256_verifier: Address,
}

impl SafeDeployment {
    const V1_4_1_BASE: Self = Self {
        safe_proxy_factory: SAFE_PROXY_FACTORY_ADDRESS,
        safe_singleton: SAFE_SINGLETON_ADDRESS,
        safe_4337_module: Address::ZERO,
        safe_module_setup: Address::ZERO,
        multi_send: MULTI_SEND_ADDRESS,
        multi_send_call_only: MULTI_SEND_CALL_ONLY_ADDRESS,
        webauthn_shared_signer: WEBAUTHN_SHARED_SIGNER_ADDRESS,
        p256_verifier: P256_VERIFIER_ADDRESS,
    };
}

//! Account configuration.
//!
//! Operators describe an account in a TOML file:
//!
//! ```toml
//! chainId = 11155111
//! entryPointVersion = "v0.7"
//! saltNonce = "0x0"
//! extraModules = ["0x1111111111111111111111111111111111111111"]
//!
//! [[setupCalls]]
//! to = "0x2222222222222222222222222222222222222222"
//! data = "0x"
//!
//! [erc7579]
//! attestersThreshold = 1
//! attesters = ["0x3333333333333333333333333333333333333333"]
//! ```
//!
//! Every contract address is optional and falls back to the canonical deployment of the
//! selected entry point version.

use alloy_primitives::{Address, Bytes, U256, aliases::U176};
use safe_contracts::{
    EntryPointVersion, ModuleInit, SafeDeployment, addresses::SAFE_7579_ADAPTER_ADDRESS,
    addresses::SAFE_7579_LAUNCHPAD_ADDRESS, p256_verifiers,
};
use safe_primitives::EntryPoint;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading or validating account configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("owner list is empty")]
    NoOwners,
    #[error("at most one passkey owner is supported, got {0}")]
    MultiplePasskeys(usize),
    #[error("threshold {threshold} is out of range for {owners} owners")]
    InvalidThreshold { threshold: usize, owners: usize },
    #[error("owner {0} is listed more than once")]
    DuplicateOwner(Address),
    #[error("passkey owner requires a WebAuthn shared signer address")]
    MissingSharedSigner,
    #[error("passkey owners cannot be configured through the ERC-7579 launchpad")]
    PasskeyWithLaunchpad,
    #[error("`{0}` resolves to the zero address")]
    MissingAddress(&'static str),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A call executed by the fresh Safe during setup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCall {
    pub to: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

/// An ERC-7579 module and its install data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub module: Address,
    #[serde(default)]
    pub init_data: Bytes,
}

impl From<&ModuleConfig> for ModuleInit {
    fn from(config: &ModuleConfig) -> Self {
        Self {
            module: config.module,
            initData: config.init_data.clone(),
        }
    }
}

/// Launchpad based deployment with ERC-7579 modules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc7579Config {
    pub launchpad: Option<Address>,
    pub adapter: Option<Address>,
    pub validators: Vec<ModuleConfig>,
    pub executors: Vec<ModuleConfig>,
    pub fallbacks: Vec<ModuleConfig>,
    pub hooks: Vec<ModuleConfig>,
    pub attesters: Vec<Address>,
    pub attesters_threshold: u8,
}

/// On-disk account configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafeAccountConfig {
    pub chain_id: u64,
    pub entry_point_version: EntryPointVersion,
    pub salt_nonce: U256,

    pub entry_point: Option<Address>,
    pub safe_proxy_factory: Option<Address>,
    pub safe_singleton: Option<Address>,
    pub safe_4337_module: Option<Address>,
    pub safe_module_setup: Option<Address>,
    pub multi_send: Option<Address>,
    /// Set to the zero address to disable passkey owners.
    pub webauthn_shared_signer: Option<Address>,
    pub p256_verifier: Option<Address>,
    /// RIP-7212 precompile address, 0 when the chain has none.
    pub p256_precompile: u16,

    pub extra_modules: Vec<Address>,
    pub setup_calls: Vec<SetupCall>,
    pub erc7579: Option<Erc7579Config>,
}

/// Validated configuration with every address filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub chain_id: u64,
    pub entry_point: EntryPoint,
    pub salt_nonce: U256,
    pub deployment: SafeDeployment,
    pub webauthn_shared_signer: Option<Address>,
    pub p256_verifiers: U176,
    pub extra_modules: Vec<Address>,
    pub setup_calls: Vec<SetupCall>,
    pub launchpad: Option<LaunchpadConfig>,
}

/// Resolved [`Erc7579Config`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchpadConfig {
    pub launchpad: Address,
    pub adapter: Address,
    pub validators: Vec<ModuleInit>,
    pub executors: Vec<ModuleInit>,
    pub fallbacks: Vec<ModuleInit>,
    pub hooks: Vec<ModuleInit>,
    pub attesters: Vec<Address>,
    pub attesters_threshold: u8,
}

impl SafeAccountConfig {
    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Canonical addresses for `version` on `chain_id`.
    pub fn new(chain_id: u64, version: EntryPointVersion) -> Self {
        Self {
            chain_id,
            entry_point_version: version,
            ..Default::default()
        }
    }

    /// Fill in canonical addresses and reject zero addresses for required contracts.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let canonical = self.entry_point_version.deployment();
        let deployment = SafeDeployment {
            safe_proxy_factory: required(
                "safeProxyFactory",
                self.safe_proxy_factory.unwrap_or(canonical.safe_proxy_factory),
            )?,
            safe_singleton: required(
                "safeSingleton",
                self.safe_singleton.unwrap_or(canonical.safe_singleton),
            )?,
            safe_4337_module: required(
                "safe4337Module",
                self.safe_4337_module.unwrap_or(canonical.safe_4337_module),
            )?,
            safe_module_setup: required(
                "safeModuleSetup",
                self.safe_module_setup.unwrap_or(canonical.safe_module_setup),
            )?,
            multi_send: required("multiSend", self.multi_send.unwrap_or(canonical.multi_send))?,
            multi_send_call_only: canonical.multi_send_call_only,
            webauthn_shared_signer: self
                .webauthn_shared_signer
                .unwrap_or(canonical.webauthn_shared_signer),
            p256_verifier: self.p256_verifier.unwrap_or(canonical.p256_verifier),
        };

        let entry_point = EntryPoint {
            address: required(
                "entryPoint",
                self.entry_point
                    .unwrap_or(self.entry_point_version.entry_point()),
            )?,
            version: self.entry_point_version,
        };

        let launchpad = self
            .erc7579
            .as_ref()
            .map(|erc7579| -> Result<_, ConfigError> {
                Ok(LaunchpadConfig {
                    launchpad: required(
                        "erc7579.launchpad",
                        erc7579.launchpad.unwrap_or(SAFE_7579_LAUNCHPAD_ADDRESS),
                    )?,
                    adapter: required(
                        "erc7579.adapter",
                        erc7579.adapter.unwrap_or(SAFE_7579_ADAPTER_ADDRESS),
                    )?,
                    validators: erc7579.validators.iter().map(Into::into).collect(),
                    executors: erc7579.executors.iter().map(Into::into).collect(),
                    fallbacks: erc7579.fallbacks.iter().map(Into::into).collect(),
                    hooks: erc7579.hooks.iter().map(Into::into).collect(),
                    attesters: erc7579.attesters.clone(),
                    attesters_threshold: erc7579.attesters_threshold,
                })
            })
            .transpose()?;

        Ok(ResolvedConfig {
            chain_id: self.chain_id,
            entry_point,
            salt_nonce: self.salt_nonce,
            webauthn_shared_signer: (!deployment.webauthn_shared_signer.is_zero())
                .then_some(deployment.webauthn_shared_signer),
            p256_verifiers: p256_verifiers(self.p256_precompile, deployment.p256_verifier),
            deployment,
            extra_modules: self.extra_modules.clone(),
            setup_calls: self.setup_calls.clone(),
            launchpad,
        })
    }
}

fn required(name: &'static str, address: Address) -> Result<Address, ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::MissingAddress(name));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::io::Write;

    #[test]
    fn test_defaults_follow_entry_point_version() {
        let resolved = SafeAccountConfig::new(1, EntryPointVersion::V06).resolve().unwrap();
        assert_eq!(resolved.deployment, EntryPointVersion::V06.deployment());
        assert_eq!(resolved.entry_point, EntryPoint::canonical(EntryPointVersion::V06));
        assert!(resolved.webauthn_shared_signer.is_some());
        assert!(resolved.launchpad.is_none());
    }

    #[test]
    fn test_zero_override_is_rejected() {
        let config = SafeAccountConfig {
            safe_4337_module: Some(Address::ZERO),
            ..SafeAccountConfig::new(1, EntryPointVersion::V07)
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::MissingAddress("safe4337Module"))
        ));
    }

    #[test]
    fn test_zero_shared_signer_disables_passkeys() {
        let config = SafeAccountConfig {
            webauthn_shared_signer: Some(Address::ZERO),
            ..SafeAccountConfig::new(1, EntryPointVersion::V07)
        };
        assert_eq!(config.resolve().unwrap().webauthn_shared_signer, None);
    }

    #[test]
    fn test_load_toml() -> eyre::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"
chainId = 11155111
entryPointVersion = "v0.6"
saltNonce = "0x2a"
safe4337Module = "0x1111111111111111111111111111111111111111"
extraModules = ["0x2222222222222222222222222222222222222222"]

[[setupCalls]]
to = "0x3333333333333333333333333333333333333333"
data = "0xdeadbeef"

[erc7579]
attesters = ["0x4444444444444444444444444444444444444444"]
attestersThreshold = 1

[[erc7579.validators]]
module = "0x5555555555555555555555555555555555555555"
initData = "0x01"
"#
        )?;

        let config = SafeAccountConfig::load(file.path())?;
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.entry_point_version, EntryPointVersion::V06);
        assert_eq!(config.salt_nonce, U256::from(42));

        let resolved = config.resolve()?;
        assert_eq!(
            resolved.deployment.safe_4337_module,
            address!("0x1111111111111111111111111111111111111111")
        );
        assert_eq!(resolved.setup_calls.len(), 1);
        assert_eq!(resolved.setup_calls[0].value, U256::ZERO);

        let launchpad = resolved.launchpad.expect("erc7579 section");
        assert_eq!(launchpad.launchpad, SAFE_7579_LAUNCHPAD_ADDRESS);
        assert_eq!(launchpad.validators.len(), 1);
        assert_eq!(launchpad.attesters_threshold, 1);
        Ok(())
    }
}

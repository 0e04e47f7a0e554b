use crate::cmd::{
    address::AddressArgs, hash::HashArgs, init_code::InitCodeArgs, inspect::InspectArgs,
    sign::SignArgs,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_transport::TransportErrorKind;
use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use safe_account::{
    ChainReader, Owner, OwnerSet, PasskeyPublicKey, ProviderChainReader, ResolvedConfig,
    SafeAccount, SafeAccountConfig, owner::LocalOwner, reader::ChainReadError,
};
use safe_contracts::EntryPointVersion;
use safe_primitives::PendingOperation;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "safe")]
#[command(version, about = "CLI for Safe 4337 accounts", long_about = None)]
pub(crate) struct SafeCli {
    #[command(subcommand)]
    pub(crate) cmd: SafeSubcommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SafeSubcommand {
    /// Derive the counterfactual account address
    Address(AddressArgs),

    /// Print factory and factory data for the first operation
    InitCode(InitCodeArgs),

    /// Compute the SafeOp hash owners sign
    Hash(HashArgs),

    /// Add this session's signature to a partial signature
    Sign(SignArgs),

    /// Decode a partial or packed signature
    Inspect(InspectArgs),
}

/// Where contract addresses come from.
#[derive(Args, Debug)]
pub(crate) struct ConfigArgs {
    /// Path to account config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chain id (ignored with --config)
    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Entry point version, v0.6 or v0.7 (ignored with --config)
    #[arg(long, default_value = "v0.7")]
    entry_point_version: EntryPointVersion,

    /// Salt nonce of the proxy deployment (overrides config)
    #[arg(long)]
    salt_nonce: Option<U256>,
}

impl ConfigArgs {
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig> {
        let mut config = match &self.config {
            Some(path) => SafeAccountConfig::load(path)
                .wrap_err_with(|| format!("failed to load {}", path.display()))?,
            None => SafeAccountConfig::new(self.chain_id, self.entry_point_version),
        };
        if let Some(salt_nonce) = self.salt_nonce {
            config.salt_nonce = salt_nonce;
        }
        Ok(config.resolve()?)
    }
}

/// Owners, threshold and chain access of an account.
#[derive(Args, Debug)]
pub(crate) struct AccountArgs {
    #[command(flatten)]
    pub(crate) config: ConfigArgs,

    /// Owner address, repeated in construction order
    #[arg(long = "owner")]
    owners: Vec<Address>,

    /// Passkey owner public key as `x,y`, listed after the owner addresses
    #[arg(long, value_parser = parse_passkey)]
    passkey: Option<PasskeyPublicKey>,

    /// Signature threshold
    #[arg(short, long, default_value_t = 1)]
    threshold: usize,

    /// RPC URL used to read the proxy creation code and deployment state
    #[arg(long)]
    rpc_url: Option<String>,

    /// Proxy creation code of the factory, skips the RPC lookup
    #[arg(long, conflicts_with = "rpc_url")]
    proxy_creation_code: Option<Bytes>,
}

impl AccountArgs {
    /// Build the account, with `local` signing for the owner whose address it holds.
    pub(crate) async fn account(&self, local: Option<LocalOwner>) -> Result<SafeAccount<CliReader>> {
        let config = self.config.resolve()?;
        let mut owners: Vec<Owner> = self
            .owners
            .iter()
            .map(|address| match &local {
                Some(owner) if owner.signer.address() == *address => Owner::Local(owner.clone()),
                _ => Owner::External(*address),
            })
            .collect();
        if let Some(public_key) = self.passkey {
            owners.push(Owner::passkey(public_key, None));
        }
        if let Some(owner) = &local
            && !self.owners.contains(&owner.signer.address())
        {
            eyre::bail!("{} is not an owner of this account", owner.signer.address());
        }

        let owners = OwnerSet::new(owners, self.threshold)?;
        Ok(SafeAccount::new(config, owners, self.reader().await?)?)
    }

    async fn reader(&self) -> Result<CliReader> {
        if let Some(code) = &self.proxy_creation_code {
            return Ok(CliReader::Offline(code.clone()));
        }
        let Some(rpc_url) = &self.rpc_url else {
            return Ok(CliReader::Unavailable);
        };
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .wrap_err_with(|| format!("failed to connect to {rpc_url}"))?
            .erased();
        Ok(CliReader::Rpc(ProviderChainReader::new(provider)))
    }
}

/// Chain access selected on the command line.
pub(crate) enum CliReader {
    Rpc(ProviderChainReader<DynProvider>),
    /// Creation code given up front; the account is assumed undeployed.
    Offline(Bytes),
    Unavailable,
}

#[async_trait::async_trait]
impl ChainReader for CliReader {
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainReadError> {
        match self {
            Self::Rpc(reader) => reader.code_at(address).await,
            Self::Offline(_) => Ok(Bytes::new()),
            Self::Unavailable => Err(unavailable()),
        }
    }

    async fn proxy_creation_code(&self, factory: Address) -> Result<Bytes, ChainReadError> {
        match self {
            Self::Rpc(reader) => reader.proxy_creation_code(factory).await,
            Self::Offline(code) => Ok(code.clone()),
            Self::Unavailable => Err(unavailable()),
        }
    }
}

fn unavailable() -> ChainReadError {
    ChainReadError::Transport(TransportErrorKind::custom_str(
        "chain access requires --rpc-url or --proxy-creation-code",
    ))
}

fn parse_passkey(value: &str) -> Result<PasskeyPublicKey, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| "expected `x,y`".to_string())?;
    let key = PasskeyPublicKey {
        x: x.trim().parse().map_err(|err| format!("invalid x: {err}"))?,
        y: y.trim().parse().map_err(|err| format!("invalid y: {err}"))?,
    };
    key.verifying_key().map_err(|err| err.to_string())?;
    Ok(key)
}

/// Read an operation JSON file, targeting the configured entry point.
pub(crate) fn load_operation(path: &Path, config: &ResolvedConfig) -> Result<PendingOperation> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let mut op: PendingOperation = serde_json::from_str(&content)
        .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
    if op.entry_point != config.entry_point {
        debug!(
            file = %op.entry_point.address,
            configured = %config.entry_point.address,
            "replacing operation entry point with the configured one"
        );
        op.entry_point = config.entry_point;
    }
    Ok(op)
}

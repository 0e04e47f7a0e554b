//! Safe 4337 account construction and multi-owner signing.
//!
//! [`SafeAccount`] ties together an [`OwnerSet`], a [`ResolvedConfig`] and a
//! [`ChainReader`]: it derives the counterfactual address, builds the factory arguments
//! for the first operation and runs signing rounds through [`OperationSigner`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod account;
pub use account::{FactoryArgs, SafeAccount};

pub mod address;
pub use address::ProxyDeployment;

pub mod collector;
pub use collector::{CollectError, SignatureCollector};

pub mod config;
pub use config::{ConfigError, ResolvedConfig, SafeAccountConfig};

mod error;
pub use error::AccountError;

pub mod init;
pub use init::InitPayloadBuilder;

pub mod owner;
pub use owner::{Owner, OwnerSet};

pub mod passkey;
pub use passkey::{PasskeyAuthenticator, PasskeyPublicKey, WebAuthnAssertion};

pub mod reader;
pub use reader::{ChainReader, ProviderChainReader};

pub mod remote;
pub use remote::{RemoteSigner, WalletSigner};

pub mod signer;
pub use signer::OperationSigner;

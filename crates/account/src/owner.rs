use crate::{
    config::ConfigError,
    passkey::{PasskeyAuthenticator, PasskeyPublicKey},
    remote::RemoteSigner,
};
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use safe_primitives::SigningMethod;
use std::{collections::HashSet, fmt, sync::Arc};

/// An owner whose key is held in this process.
#[derive(Clone, Debug)]
pub struct LocalOwner {
    pub signer: PrivateKeySigner,
    pub method: SigningMethod,
}

/// A passkey owner. Without an authenticator it can only be listed, not asked to sign.
#[derive(Clone)]
pub struct PasskeyOwner {
    pub public_key: PasskeyPublicKey,
    pub authenticator: Option<Arc<dyn PasskeyAuthenticator>>,
}

impl fmt::Debug for PasskeyOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasskeyOwner")
            .field("public_key", &self.public_key)
            .field("has_authenticator", &self.authenticator.is_some())
            .finish()
    }
}

/// A Safe owner.
#[derive(Clone)]
pub enum Owner {
    Local(LocalOwner),
    Remote(Arc<dyn RemoteSigner>),
    Passkey(PasskeyOwner),
    /// Signs in another session; only its address is known here.
    External(Address),
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(owner) => f.debug_tuple("Local").field(&owner.signer.address()).finish(),
            Self::Remote(signer) => f.debug_tuple("Remote").field(&signer.address()).finish(),
            Self::Passkey(owner) => f.debug_tuple("Passkey").field(owner).finish(),
            Self::External(address) => f.debug_tuple("External").field(address).finish(),
        }
    }
}

impl Owner {
    pub fn local(signer: PrivateKeySigner) -> Self {
        Self::Local(LocalOwner {
            signer,
            method: SigningMethod::TypedData,
        })
    }

    pub fn remote(signer: impl RemoteSigner + 'static) -> Self {
        Self::Remote(Arc::new(signer))
    }

    pub fn passkey(
        public_key: PasskeyPublicKey,
        authenticator: Option<Arc<dyn PasskeyAuthenticator>>,
    ) -> Self {
        Self::Passkey(PasskeyOwner {
            public_key,
            authenticator,
        })
    }

    /// The address listed in the Safe owner list.
    ///
    /// Passkey owners are represented by the WebAuthn shared signer.
    pub fn address(&self, shared_signer: Option<Address>) -> Result<Address, ConfigError> {
        match self {
            Self::Local(owner) => Ok(owner.signer.address()),
            Self::Remote(signer) => Ok(signer.address()),
            Self::Passkey(_) => shared_signer.ok_or(ConfigError::MissingSharedSigner),
            Self::External(address) => Ok(*address),
        }
    }

    /// Whether this session can produce a proof for the owner.
    pub fn can_sign(&self) -> bool {
        match self {
            Self::Local(_) | Self::Remote(_) => true,
            Self::Passkey(owner) => owner.authenticator.is_some(),
            Self::External(_) => false,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
            Self::Passkey(_) => "passkey",
            Self::External(_) => "external",
        }
    }
}

/// Owners in construction order and the signature threshold.
#[derive(Clone, Debug)]
pub struct OwnerSet {
    owners: Vec<Owner>,
    threshold: usize,
}

impl OwnerSet {
    pub fn new(owners: Vec<Owner>, threshold: usize) -> Result<Self, ConfigError> {
        if owners.is_empty() {
            return Err(ConfigError::NoOwners);
        }
        let passkeys = owners.iter().filter(|owner| matches!(owner, Owner::Passkey(_))).count();
        if passkeys > 1 {
            return Err(ConfigError::MultiplePasskeys(passkeys));
        }
        if threshold == 0 || threshold > owners.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }
        Ok(Self { owners, threshold })
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn passkey(&self) -> Option<&PasskeyOwner> {
        self.owners.iter().find_map(|owner| match owner {
            Owner::Passkey(passkey) => Some(passkey),
            _ => None,
        })
    }

    /// On-chain owner addresses in construction order.
    pub fn addresses(&self, shared_signer: Option<Address>) -> Result<Vec<Address>, ConfigError> {
        let mut seen = HashSet::with_capacity(self.owners.len());
        self.owners
            .iter()
            .map(|owner| {
                let address = owner.address(shared_signer)?;
                if !seen.insert(address) {
                    return Err(ConfigError::DuplicateOwner(address));
                }
                Ok(address)
            })
            .collect()
    }
}

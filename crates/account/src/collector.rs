//! Per-owner proof collection.

use crate::{
    config::ConfigError,
    owner::Owner,
    passkey::{PasskeyError, encode_assertion},
    remote::RemoteSignerError,
};
use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use safe_primitives::{
    OperationError, PendingOperation, Proof, SigningMethod,
    signature::{ProofData, ProofError, recover_signer},
};
use tracing::debug;

/// Errors raised while obtaining an owner's proof.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("owner {0} cannot sign in this session")]
    NotSignable(Address),
    #[error("no proof obtained from {owner}: {source}")]
    Rejected {
        owner: Address,
        #[source]
        source: RemoteSignerError,
    },
    #[error("passkey proof rejected: {0}")]
    Passkey(#[from] PasskeyError),
    #[error("signature from {expected} recovers to {recovered}")]
    WrongSigner { expected: Address, recovered: Address },
    #[error(transparent)]
    Local(#[from] alloy_signer::Error),
    #[error(transparent)]
    Proof(#[from] ProofError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Produces owner proofs over the `SafeOp` digest of an operation.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCollector {
    chain_id: u64,
    safe_4337_module: Address,
    shared_signer: Option<Address>,
}

impl SignatureCollector {
    pub const fn new(chain_id: u64, safe_4337_module: Address, shared_signer: Option<Address>) -> Self {
        Self {
            chain_id,
            safe_4337_module,
            shared_signer,
        }
    }

    /// The digest owners sign for `op`.
    pub fn digest(&self, op: &PendingOperation) -> Result<B256, OperationError> {
        op.safe_op_hash(self.chain_id, self.safe_4337_module)
    }

    /// Collect `owner`'s proof for `op`.
    pub async fn collect(&self, owner: &Owner, op: &PendingOperation) -> Result<Proof, CollectError> {
        let digest = self.digest(op)?;
        self.collect_digest(owner, digest).await
    }

    /// Collect `owner`'s proof over an already computed digest.
    pub async fn collect_digest(&self, owner: &Owner, digest: B256) -> Result<Proof, CollectError> {
        let address = owner.address(self.shared_signer)?;
        debug!(owner = %address, kind = owner.kind(), %digest, "collecting proof");

        let proof = match owner {
            Owner::Local(local) => {
                let signature = match local.method {
                    SigningMethod::TypedData => local.signer.sign_hash_sync(&digest)?,
                    SigningMethod::PersonalSign => {
                        local.signer.sign_message_sync(digest.as_slice())?
                    }
                };
                Proof::ecdsa(address, &signature, local.method)
            }
            Owner::Remote(signer) => {
                let raw = signer
                    .sign_digest(digest)
                    .await
                    .map_err(|source| CollectError::Rejected {
                        owner: address,
                        source,
                    })?;
                let proof = Proof::from_raw_ecdsa(address, &raw, signer.signing_method())?;
                ensure_signer(&proof, digest)?;
                proof
            }
            Owner::Passkey(passkey) => {
                let authenticator = passkey
                    .authenticator
                    .as_ref()
                    .ok_or(CollectError::NotSignable(address))?;
                let assertion = authenticator.get_assertion(digest).await?;
                let data = encode_assertion(&passkey.public_key, &assertion, digest)?;
                Proof::dynamic(address, data)
            }
            Owner::External(_) => return Err(CollectError::NotSignable(address)),
        };

        Ok(proof)
    }
}

/// A wallet may answer with a key other than the one it advertised.
fn ensure_signer(proof: &Proof, digest: B256) -> Result<(), CollectError> {
    if let ProofData::Static(signature) = &proof.data {
        let recovered = recover_signer(signature, digest)?;
        if recovered != proof.signer {
            return Err(CollectError::WrongSigner {
                expected: proof.signer,
                recovered,
            });
        }
    }
    Ok(())
}

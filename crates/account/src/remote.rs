//! Owners whose keys live outside this process.

use alloy_primitives::{Address, B256, Bytes};
use safe_primitives::SigningMethod;

/// Errors surfaced by a remote signer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteSignerError {
    /// The user or the wallet declined the request.
    #[error("signature request rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
}

/// A wallet or session key that signs SafeOp digests on request.
#[async_trait::async_trait]
pub trait RemoteSigner: Send + Sync {
    /// Owner address registered on the Safe.
    fn address(&self) -> Address;

    /// How [`sign_digest`](Self::sign_digest) signs the digest.
    fn signing_method(&self) -> SigningMethod {
        SigningMethod::TypedData
    }

    /// Sign `digest`, returning `r ++ s ++ v`.
    async fn sign_digest(&self, digest: B256) -> Result<Bytes, RemoteSignerError>;
}

/// Adapts any [`alloy_signer::Signer`] into a [`RemoteSigner`].
#[derive(Debug, Clone)]
pub struct WalletSigner<S> {
    inner: S,
    method: SigningMethod,
}

impl<S> WalletSigner<S> {
    /// Sign digests directly.
    pub const fn typed_data(inner: S) -> Self {
        Self {
            inner,
            method: SigningMethod::TypedData,
        }
    }

    /// Sign digests as EIP-191 personal messages, for wallets that cannot sign raw hashes.
    pub const fn personal_sign(inner: S) -> Self {
        Self {
            inner,
            method: SigningMethod::PersonalSign,
        }
    }
}

#[async_trait::async_trait]
impl<S> RemoteSigner for WalletSigner<S>
where
    S: alloy_signer::Signer + Send + Sync,
{
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn signing_method(&self) -> SigningMethod {
        self.method
    }

    async fn sign_digest(&self, digest: B256) -> Result<Bytes, RemoteSignerError> {
        let signature = match self.method {
            SigningMethod::TypedData => self.inner.sign_hash(&digest).await?,
            SigningMethod::PersonalSign => self.inner.sign_message(digest.as_slice()).await?,
        };
        Ok(signature.as_bytes().into())
    }
}

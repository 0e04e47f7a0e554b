//! Read-only chain access needed before an account exists.

use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport::TransportError;
use safe_contracts::ISafeProxyFactory;
use tracing::debug;

/// Errors raised while reading chain state.
#[derive(Debug, thiserror::Error)]
pub enum ChainReadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to decode `{call}` result: {source}")]
    Decode {
        call: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },
}

/// Chain state consumed by address derivation and deployment detection.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at `address`, empty when nothing is deployed.
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainReadError>;

    /// `proxyCreationCode()` of the Safe proxy factory at `factory`.
    async fn proxy_creation_code(&self, factory: Address) -> Result<Bytes, ChainReadError>;
}

/// [`ChainReader`] backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct ProviderChainReader<P> {
    provider: P,
}

impl<P> ProviderChainReader<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P> ChainReader for ProviderChainReader<P>
where
    P: Provider + Send + Sync,
{
    async fn code_at(&self, address: Address) -> Result<Bytes, ChainReadError> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn proxy_creation_code(&self, factory: Address) -> Result<Bytes, ChainReadError> {
        let tx = TransactionRequest::default()
            .to(factory)
            .input(ISafeProxyFactory::proxyCreationCodeCall {}.abi_encode().into());
        let output = self.provider.call(tx).await?;
        let code = ISafeProxyFactory::proxyCreationCodeCall::abi_decode_returns(&output).map_err(
            |source| ChainReadError::Decode {
                call: "proxyCreationCode",
                source,
            },
        )?;
        debug!(%factory, len = code.len(), "fetched proxy creation code");
        Ok(code)
    }
}

use crate::{
    address::ProxyDeployment,
    collector::SignatureCollector,
    config::ResolvedConfig,
    error::AccountError,
    init::InitPayloadBuilder,
    owner::OwnerSet,
    reader::ChainReader,
    signer::OperationSigner,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use safe_primitives::{AggregatedSignature, PendingOperation};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// `factory` and `factoryData` of the first user operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryArgs {
    pub factory: Address,
    pub factory_data: Bytes,
}

/// A Safe account handle: owners, configuration and the cached counterfactual address.
#[derive(Debug)]
pub struct SafeAccount<R> {
    config: ResolvedConfig,
    owners: OwnerSet,
    reader: R,
    proxy_creation_code: OnceCell<Bytes>,
    address: OnceCell<Address>,
}

impl<R: ChainReader> SafeAccount<R> {
    /// Validates that every owner resolves to a distinct address.
    pub fn new(config: ResolvedConfig, owners: OwnerSet, reader: R) -> Result<Self, AccountError> {
        InitPayloadBuilder::new(&config).build(&owners)?;
        Ok(Self {
            config,
            owners,
            reader,
            proxy_creation_code: OnceCell::new(),
            address: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn owners(&self) -> &OwnerSet {
        &self.owners
    }

    /// On-chain owner addresses in construction order.
    pub fn owner_addresses(&self) -> Result<Vec<Address>, AccountError> {
        Ok(self.owners.addresses(self.config.webauthn_shared_signer)?)
    }

    /// The `initializer` executed by the factory on deployment.
    pub fn initializer(&self) -> Result<Bytes, AccountError> {
        Ok(InitPayloadBuilder::new(&self.config).build(&self.owners)?)
    }

    pub fn proxy_deployment(&self) -> Result<ProxyDeployment, AccountError> {
        Ok(ProxyDeployment {
            factory: self.config.deployment.safe_proxy_factory,
            singleton: InitPayloadBuilder::new(&self.config).singleton(),
            initializer: self.initializer()?,
            salt_nonce: self.config.salt_nonce,
        })
    }

    /// Proxy creation code of the configured factory, read once.
    pub async fn proxy_creation_code(&self) -> Result<&Bytes, AccountError> {
        let factory = self.config.deployment.safe_proxy_factory;
        Ok(self
            .proxy_creation_code
            .get_or_try_init(|| self.reader.proxy_creation_code(factory))
            .await?)
    }

    /// The address the account is (or will be) deployed at.
    pub async fn address(&self) -> Result<Address, AccountError> {
        self.address
            .get_or_try_init(|| async {
                let code = self.proxy_creation_code().await?;
                let address = self.proxy_deployment()?.address(code);
                info!(
                    %address,
                    owners = self.owners.len(),
                    threshold = self.owners.threshold(),
                    "derived account address"
                );
                Ok::<_, AccountError>(address)
            })
            .await
            .copied()
    }

    pub async fn is_deployed(&self) -> Result<bool, AccountError> {
        let address = self.address().await?;
        Ok(!self.reader.code_at(address).await?.is_empty())
    }

    /// Factory arguments for the next operation; `None` once the account is deployed.
    pub async fn factory_args(&self) -> Result<Option<FactoryArgs>, AccountError> {
        if self.is_deployed().await? {
            debug!("account deployed, omitting factory arguments");
            return Ok(None);
        }
        let deployment = self.proxy_deployment()?;
        Ok(Some(FactoryArgs {
            factory: deployment.factory,
            factory_data: deployment.factory_data(),
        }))
    }

    /// An unsigned operation from this account, carrying factory arguments when the
    /// account is not deployed yet. Gas fields are left for the caller to fill.
    pub async fn prepare_operation(
        &self,
        call_data: Bytes,
        nonce: U256,
    ) -> Result<PendingOperation, AccountError> {
        let factory_args = self.factory_args().await?;
        Ok(PendingOperation {
            sender: self.address().await?,
            nonce,
            factory: factory_args.as_ref().map(|args| args.factory),
            factory_data: factory_args.map(|args| args.factory_data).unwrap_or_default(),
            call_data,
            entry_point: self.config.entry_point,
            ..Default::default()
        })
    }

    pub fn collector(&self) -> SignatureCollector {
        SignatureCollector::new(
            self.config.chain_id,
            self.config.deployment.safe_4337_module,
            self.config.webauthn_shared_signer,
        )
    }

    /// The `SafeOp` digest owners sign for `op`.
    pub fn operation_hash(&self, op: &PendingOperation) -> Result<B256, AccountError> {
        Ok(self.collector().digest(op)?)
    }

    pub fn operation_signer(&self) -> Result<OperationSigner<'_>, AccountError> {
        OperationSigner::new(&self.owners, self.collector(), self.config.webauthn_shared_signer)
    }

    /// Run a signing round for `op`, resuming from `existing_partial`.
    pub async fn sign_operation(
        &self,
        op: &PendingOperation,
        existing_partial: Option<&[u8]>,
    ) -> Result<AggregatedSignature, AccountError> {
        self.operation_signer()?.sign(op, existing_partial).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ConfigError, Erc7579Config, SafeAccountConfig},
        owner::Owner,
        passkey::PasskeyPublicKey,
        reader::ChainReadError,
    };
    use alloy_primitives::hex;
    use safe_contracts::EntryPointVersion;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct MockReader {
        deployed: bool,
        creation_code_reads: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ChainReader for MockReader {
        async fn code_at(&self, _address: Address) -> Result<Bytes, ChainReadError> {
            Ok(if self.deployed { Bytes::from_static(&[0x60]) } else { Bytes::new() })
        }

        async fn proxy_creation_code(&self, _factory: Address) -> Result<Bytes, ChainReadError> {
            self.creation_code_reads.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::copy_from_slice(&hex!("608060405234801561001057600080fd5b50")))
        }
    }

    fn account(reader: MockReader) -> SafeAccount<MockReader> {
        let config = SafeAccountConfig::new(1, EntryPointVersion::V07).resolve().unwrap();
        let owners = OwnerSet::new(
            vec![
                Owner::External(Address::repeat_byte(0x01)),
                Owner::External(Address::repeat_byte(0x02)),
            ],
            2,
        )
        .unwrap();
        SafeAccount::new(config, owners, reader).unwrap()
    }

    #[tokio::test]
    async fn test_address_is_cached() {
        let reads = Arc::new(AtomicUsize::new(0));
        let account = account(MockReader {
            deployed: false,
            creation_code_reads: reads.clone(),
        });

        let first = account.address().await.unwrap();
        let second = account.address().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_args_round_trip_to_address() {
        let account = account(MockReader::default());
        let args = account.factory_args().await.unwrap().expect("not deployed");
        assert_eq!(args.factory, account.config().deployment.safe_proxy_factory);

        let code = account.proxy_creation_code().await.unwrap().clone();
        let decoded = ProxyDeployment::from_factory_data(args.factory, &args.factory_data).unwrap();
        assert_eq!(decoded.address(&code), account.address().await.unwrap());
    }

    #[tokio::test]
    async fn test_deployed_account_omits_factory_args() {
        let account = account(MockReader {
            deployed: true,
            ..Default::default()
        });
        assert_eq!(account.factory_args().await.unwrap(), None);

        let op = account.prepare_operation(Bytes::new(), U256::ZERO).await.unwrap();
        assert!(op.factory.is_none());
        assert!(op.init_code().is_empty());
        assert_eq!(op.sender, account.address().await.unwrap());
    }

    #[test]
    fn test_launchpad_account_with_passkey_fails_to_build() {
        let config = SafeAccountConfig {
            erc7579: Some(Erc7579Config::default()),
            ..SafeAccountConfig::new(1, EntryPointVersion::V07)
        }
        .resolve()
        .unwrap();
        let owners = OwnerSet::new(
            vec![
                Owner::External(Address::repeat_byte(0x01)),
                Owner::passkey(
                    PasskeyPublicKey {
                        x: U256::from(3),
                        y: U256::from(4),
                    },
                    None,
                ),
            ],
            2,
        )
        .unwrap();

        let err = SafeAccount::new(config, owners, MockReader::default()).err().unwrap();
        assert!(matches!(
            err,
            AccountError::Config(ConfigError::PasskeyWithLaunchpad)
        ));
    }
}

//! The `initializer` the proxy factory calls on a freshly created Safe proxy.

use crate::{
    config::{ConfigError, LaunchpadConfig, ResolvedConfig, SetupCall},
    owner::OwnerSet,
};
use alloy_primitives::{Address, Bytes, U256, keccak256};
use alloy_sol_types::{SolCall, SolValue};
use safe_contracts::{
    IMultiSend, ISafe, ISafe7579Launchpad, ISafeModuleSetup, ISafeWebAuthnSharedSigner,
};

/// MultiSend operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

/// A single MultiSend entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSendTransaction {
    pub operation: Operation,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl MultiSendTransaction {
    pub fn delegate_call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            operation: Operation::DelegateCall,
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    /// Packed `uint8 operation ++ address to ++ uint256 value ++ uint256 length ++ data`.
    pub fn encode_packed(&self, out: &mut Vec<u8>) {
        out.push(self.operation as u8);
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(&self.value.to_be_bytes::<32>());
        out.extend_from_slice(&U256::from(self.data.len()).to_be_bytes::<32>());
        out.extend_from_slice(&self.data);
    }
}

impl From<&SetupCall> for MultiSendTransaction {
    fn from(call: &SetupCall) -> Self {
        Self {
            operation: Operation::Call,
            to: call.to,
            value: call.value,
            data: call.data.clone(),
        }
    }
}

/// `multiSend(bytes)` call data for `transactions`.
pub fn encode_multi_send(transactions: &[MultiSendTransaction]) -> Bytes {
    let mut packed = Vec::new();
    for tx in transactions {
        tx.encode_packed(&mut packed);
    }
    IMultiSend::multiSendCall {
        transactions: packed.into(),
    }
    .abi_encode()
    .into()
}

/// Builds the initializer for an owner set under a resolved configuration.
#[derive(Debug, Clone, Copy)]
pub struct InitPayloadBuilder<'a> {
    config: &'a ResolvedConfig,
}

impl<'a> InitPayloadBuilder<'a> {
    pub const fn new(config: &'a ResolvedConfig) -> Self {
        Self { config }
    }

    /// The contract the proxy initially delegates to: the launchpad in ERC-7579 mode,
    /// the Safe singleton otherwise.
    pub fn singleton(&self) -> Address {
        match &self.config.launchpad {
            Some(launchpad) => launchpad.launchpad,
            None => self.config.deployment.safe_singleton,
        }
    }

    /// Initializer call data for `owners`.
    ///
    /// The launchpad never runs the shared signer `configure` delegatecall, so a passkey
    /// owner is rejected there.
    pub fn build(&self, owners: &OwnerSet) -> Result<Bytes, ConfigError> {
        if self.config.launchpad.is_some() && owners.passkey().is_some() {
            return Err(ConfigError::PasskeyWithLaunchpad);
        }
        let addresses = owners.addresses(self.config.webauthn_shared_signer)?;
        let threshold = U256::from(owners.threshold());
        match &self.config.launchpad {
            Some(launchpad) => Ok(self.launchpad_initializer(launchpad, addresses, threshold)),
            None => Ok(self.setup_initializer(owners, addresses, threshold)),
        }
    }

    /// The transactions `setup` batches through MultiSend.
    pub fn setup_transactions(&self, owners: &OwnerSet) -> Vec<MultiSendTransaction> {
        let deployment = &self.config.deployment;

        let mut modules = vec![deployment.safe_4337_module];
        modules.extend_from_slice(&self.config.extra_modules);
        let mut transactions = vec![MultiSendTransaction::delegate_call(
            deployment.safe_module_setup,
            ISafeModuleSetup::enableModulesCall { modules }.abi_encode(),
        )];

        if let (Some(passkey), Some(shared_signer)) =
            (owners.passkey(), self.config.webauthn_shared_signer)
        {
            let configure = ISafeWebAuthnSharedSigner::configureCall {
                signer: ISafeWebAuthnSharedSigner::Signer {
                    x: passkey.public_key.x,
                    y: passkey.public_key.y,
                    verifiers: self.config.p256_verifiers,
                },
            };
            transactions.push(MultiSendTransaction::delegate_call(
                shared_signer,
                configure.abi_encode(),
            ));
        }

        transactions.extend(self.config.setup_calls.iter().map(MultiSendTransaction::from));
        transactions
    }

    fn setup_initializer(&self, owners: &OwnerSet, addresses: Vec<Address>, threshold: U256) -> Bytes {
        let deployment = &self.config.deployment;
        ISafe::setupCall {
            owners: addresses,
            threshold,
            to: deployment.multi_send,
            data: encode_multi_send(&self.setup_transactions(owners)),
            fallbackHandler: deployment.safe_4337_module,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        }
        .abi_encode()
        .into()
    }

    fn launchpad_initializer(
        &self,
        launchpad: &LaunchpadConfig,
        addresses: Vec<Address>,
        threshold: U256,
    ) -> Bytes {
        let setup_data: Bytes = ISafe7579Launchpad::initSafe7579Call {
            safe7579: launchpad.adapter,
            executors: launchpad.executors.clone(),
            fallbacks: launchpad.fallbacks.clone(),
            hooks: launchpad.hooks.clone(),
            attesters: launchpad.attesters.clone(),
            threshold: launchpad.attesters_threshold,
        }
        .abi_encode()
        .into();

        let init_hash = keccak256(
            (
                self.config.deployment.safe_singleton,
                addresses,
                threshold,
                launchpad.launchpad,
                setup_data,
                launchpad.adapter,
                launchpad.validators.clone(),
            )
                .abi_encode_params(),
        );

        ISafe7579Launchpad::preValidationSetupCall {
            initHash: init_hash,
            to: Address::ZERO,
            preInit: Bytes::new(),
        }
        .abi_encode()
        .into()
    }
}

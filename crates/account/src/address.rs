//! Counterfactual Safe address, replicating `SafeProxyFactory.createProxyWithNonce`.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::SolCall;
use safe_contracts::ISafeProxyFactory;

/// `keccak256(keccak256(initializer) ++ uint256(saltNonce))`
pub fn proxy_salt(initializer: &[u8], salt_nonce: U256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(keccak256(initializer).as_slice());
    preimage[32..].copy_from_slice(&salt_nonce.to_be_bytes::<32>());
    keccak256(preimage)
}

/// `proxyCreationCode ++ uint256(uint160(singleton))`
pub fn deployment_code(proxy_creation_code: &[u8], singleton: Address) -> Vec<u8> {
    [proxy_creation_code, singleton.into_word().as_slice()].concat()
}

/// Inputs of a proxy deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyDeployment {
    pub factory: Address,
    pub singleton: Address,
    pub initializer: Bytes,
    pub salt_nonce: U256,
}

impl ProxyDeployment {
    /// The CREATE2 address the factory deploys this proxy to.
    pub fn address(&self, proxy_creation_code: &[u8]) -> Address {
        let salt = proxy_salt(&self.initializer, self.salt_nonce);
        let init_code_hash = keccak256(deployment_code(proxy_creation_code, self.singleton));
        self.factory.create2(salt, init_code_hash)
    }

    /// `createProxyWithNonce(singleton, initializer, saltNonce)` call data, submitted as
    /// the user operation factory data.
    pub fn factory_data(&self) -> Bytes {
        ISafeProxyFactory::createProxyWithNonceCall {
            singleton: self.singleton,
            initializer: self.initializer.clone(),
            saltNonce: self.salt_nonce,
        }
        .abi_encode()
        .into()
    }

    /// Inverse of [`factory_data`](Self::factory_data).
    pub fn from_factory_data(factory: Address, data: &[u8]) -> Result<Self, alloy_sol_types::Error> {
        let call = ISafeProxyFactory::createProxyWithNonceCall::abi_decode(data)?;
        Ok(Self {
            factory,
            singleton: call.singleton,
            initializer: call.initializer,
            salt_nonce: call.saltNonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    const CREATION_CODE: &[u8] = &hex!("608060405234801561001057600080fd5b50");

    fn deployment() -> ProxyDeployment {
        ProxyDeployment {
            factory: Address::repeat_byte(0xfa),
            singleton: Address::repeat_byte(0x5e),
            initializer: Bytes::from_static(&[0xb6, 0x3e, 0x80, 0x0d, 0x01]),
            salt_nonce: U256::from(7),
        }
    }

    #[test]
    fn test_matches_create2_from_code() {
        let deployment = deployment();
        let salt = proxy_salt(&deployment.initializer, deployment.salt_nonce);
        let expected = deployment.factory.create2_from_code(
            salt,
            deployment_code(CREATION_CODE, deployment.singleton),
        );
        assert_eq!(deployment.address(CREATION_CODE), expected);
    }

    #[test]
    fn test_factory_data_roundtrip() {
        let deployment = deployment();
        let decoded =
            ProxyDeployment::from_factory_data(deployment.factory, &deployment.factory_data())
                .unwrap();
        assert_eq!(decoded, deployment);
        assert_eq!(decoded.address(CREATION_CODE), deployment.address(CREATION_CODE));
    }

    #[test]
    fn test_any_input_change_moves_the_address() {
        let base = deployment();
        let address = base.address(CREATION_CODE);

        let mut initializer = base.initializer.to_vec();
        initializer[4] ^= 1;
        let variants = [
            ProxyDeployment { initializer: initializer.into(), ..base.clone() },
            ProxyDeployment { salt_nonce: U256::from(8), ..base.clone() },
            ProxyDeployment { singleton: Address::repeat_byte(0x5f), ..base.clone() },
            ProxyDeployment { factory: Address::repeat_byte(0xfb), ..base.clone() },
        ];
        for variant in variants {
            assert_ne!(variant.address(CREATION_CODE), address, "{variant:?}");
        }

        let mut code = CREATION_CODE.to_vec();
        code[0] ^= 1;
        assert_ne!(base.address(&code), address);
    }
}

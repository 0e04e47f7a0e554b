crate::sol! {
    /// Safe singleton (v1.4.1) initialization surface.
    ///
    /// `setup` is invoked exactly once, by the proxy factory, right after the proxy is
    /// created. Owners and threshold are written first, then `to` is delegatecalled with
    /// `data`, which is how module bootstrap is batched into deployment.
    #[derive(Debug, PartialEq, Eq)]
    interface ISafe {
        /// @param owners List of Safe owners
        /// @param threshold Number of required confirmations for a Safe transaction
        /// @param to Contract address for optional delegate call
        /// @param data Data payload for optional delegate call
        /// @param fallbackHandler Handler for fallback calls to this contract
        /// @param paymentToken Token that should be used for the payment (0 is ETH)
        /// @param payment Value that should be paid
        /// @param paymentReceiver Address that should receive the payment (or 0 if tx.origin)
        function setup(
            address[] calldata owners,
            uint256 threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;

        function getOwners() external view returns (address[] memory);

        function getThreshold() external view returns (uint256);
    }

    /// Safe proxy factory (v1.4.1).
    #[derive(Debug, PartialEq, Eq)]
    interface ISafeProxyFactory {
        /// Deploys a proxy with CREATE2, salted with `keccak256(keccak256(initializer) ++ saltNonce)`,
        /// and calls it with `initializer`.
        function createProxyWithNonce(
            address singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);

        /// Creation bytecode of the proxy, without the constructor argument.
        function proxyCreationCode() external pure returns (bytes memory);

        event ProxyCreation(address indexed proxy, address singleton);
    }

    /// Batches transactions; supports both calls and delegatecalls.
    #[derive(Debug, PartialEq, Eq)]
    interface IMultiSend {
        /// @param transactions Packed `operation (uint8) ++ to (address) ++ value (uint256) ++ dataLength (uint256) ++ data` entries
        function multiSend(bytes memory transactions) external payable;
    }

    /// Library delegatecalled from `setup` to enable modules on the fresh Safe.
    #[derive(Debug, PartialEq, Eq)]
    interface ISafeModuleSetup {
        function enableModules(address[] calldata modules) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn test_well_known_selectors() {
        assert_eq!(ISafe::setupCall::SELECTOR, [0xb6, 0x3e, 0x80, 0x0d]);
        assert_eq!(
            ISafeProxyFactory::createProxyWithNonceCall::SELECTOR,
            [0x16, 0x88, 0xf0, 0xb9]
        );
        assert_eq!(IMultiSend::multiSendCall::SELECTOR, [0x8d, 0x80, 0xff, 0x0a]);
    }

    #[test]
    fn test_create_proxy_roundtrip() {
        let call = ISafeProxyFactory::createProxyWithNonceCall {
            singleton: Address::random(),
            initializer: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            saltNonce: U256::from(7),
        };

        let encoded = call.abi_encode();
        let decoded = ISafeProxyFactory::createProxyWithNonceCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded, call);
    }
}

use alloy_primitives::{Address, aliases::U176};

crate::sol! {
    /// Shared WebAuthn signer (safe-modules v0.2.1).
    ///
    /// A single deployment acts as the owner for every passkey-controlled Safe. The
    /// passkey public key lives in the Safe's own storage, written by delegatecalling
    /// `configure` during setup, and signatures are checked through the ERC-1271
    /// contract-signature path of `checkSignatures`.
    #[derive(Debug, PartialEq, Eq)]
    interface ISafeWebAuthnSharedSigner {
        /// Public key coordinates and the P-256 verifier selection.
        ///
        /// `verifiers` packs the precompile address in the upper 16 bits and the
        /// fallback verifier contract in the lower 160 bits.
        struct Signer {
            uint256 x;
            uint256 y;
            uint176 verifiers;
        }

        function configure(Signer signer) external;

        function getConfiguration(address account) external view returns (Signer memory signer);

        /// Signature is `abi.encode(bytes authenticatorData, string clientDataFields, uint256[2] signature)`.
        function isValidSignature(bytes32 message, bytes calldata signature) external view returns (bytes4 magicValue);
    }
}

/// Packs a P-256 verifier selection into the shared signer's `uint176` tag.
///
/// `precompile` is the RIP-7212 precompile address (0 when the chain has none) and only
/// its low 16 bits are kept.
pub fn p256_verifiers(precompile: u16, fallback: Address) -> U176 {
    (U176::from(precompile) << 160) | U176::from_be_slice(fallback.as_slice())
}

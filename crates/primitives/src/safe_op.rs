//! EIP-712 `SafeOp` digests signed by Safe owners.
//!
//! The Safe 4337 module verifies owner signatures over a `SafeOp` struct hashed in the
//! domain `{chainId, verifyingContract: module}`. The struct layout follows the user
//! operation layout of the targeted entry point, so the two entry point generations hash
//! differently and are kept in a small table keyed by [`EntryPointVersion`].

use crate::operation::{OperationError, PendingOperation};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use safe_contracts::EntryPointVersion;
use std::borrow::Cow;

pub mod v06 {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct SafeOp {
            address safe;
            uint256 nonce;
            bytes initCode;
            bytes callData;
            uint256 callGasLimit;
            uint256 verificationGasLimit;
            uint256 preVerificationGas;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            bytes paymasterAndData;
            uint48 validAfter;
            uint48 validUntil;
            address entryPoint;
        }
    }
}

pub mod v07 {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct SafeOp {
            address safe;
            uint256 nonce;
            bytes initCode;
            bytes callData;
            uint128 verificationGasLimit;
            uint128 callGasLimit;
            uint256 preVerificationGas;
            uint128 maxPriorityFeePerGas;
            uint128 maxFeePerGas;
            bytes paymasterAndData;
            uint48 validAfter;
            uint48 validUntil;
            address entryPoint;
        }
    }
}

/// Hashing strategy for one entry point generation.
#[derive(Debug)]
pub struct SafeOpScheme {
    pub version: EntryPointVersion,
    encode_type: fn() -> Cow<'static, str>,
    signing_hash: fn(&PendingOperation, &Eip712Domain) -> Result<B256, OperationError>,
}

impl SafeOpScheme {
    /// The EIP-712 type string of this scheme's `SafeOp` struct.
    pub fn encode_type(&self) -> Cow<'static, str> {
        (self.encode_type)()
    }

    pub fn signing_hash(
        &self,
        op: &PendingOperation,
        domain: &Eip712Domain,
    ) -> Result<B256, OperationError> {
        (self.signing_hash)(op, domain)
    }
}

/// One scheme per supported entry point version.
pub static SAFE_OP_SCHEMES: [SafeOpScheme; 2] = [
    SafeOpScheme {
        version: EntryPointVersion::V06,
        encode_type: <v06::SafeOp as SolStruct>::eip712_encode_type,
        signing_hash: v06_signing_hash,
    },
    SafeOpScheme {
        version: EntryPointVersion::V07,
        encode_type: <v07::SafeOp as SolStruct>::eip712_encode_type,
        signing_hash: v07_signing_hash,
    },
];

/// Scheme matching `version`.
pub fn scheme(version: EntryPointVersion) -> &'static SafeOpScheme {
    match version {
        EntryPointVersion::V06 => &SAFE_OP_SCHEMES[0],
        EntryPointVersion::V07 => &SAFE_OP_SCHEMES[1],
    }
}

/// The domain the 4337 module verifies `SafeOp` signatures in. No name, no version.
pub fn safe_op_domain(chain_id: u64, safe_4337_module: Address) -> Eip712Domain {
    Eip712Domain::new(
        None,
        None,
        Some(U256::from(chain_id)),
        Some(safe_4337_module),
        None,
    )
}

impl PendingOperation {
    /// The digest every owner signs for this operation.
    pub fn safe_op_hash(
        &self,
        chain_id: u64,
        safe_4337_module: Address,
    ) -> Result<B256, OperationError> {
        let domain = safe_op_domain(chain_id, safe_4337_module);
        scheme(self.version()).signing_hash(self, &domain)
    }

    pub fn to_v06_safe_op(&self) -> Result<v06::SafeOp, OperationError> {
        Ok(v06::SafeOp {
            safe: self.sender,
            nonce: self.nonce,
            initCode: self.init_code(),
            callData: self.call_data.clone(),
            callGasLimit: self.call_gas_limit,
            verificationGasLimit: self.verification_gas_limit,
            preVerificationGas: self.pre_verification_gas,
            maxFeePerGas: self.max_fee_per_gas,
            maxPriorityFeePerGas: self.max_priority_fee_per_gas,
            paymasterAndData: self.paymaster_and_data()?,
            validAfter: self.validity.valid_after_u48()?,
            validUntil: self.validity.valid_until_u48()?,
            entryPoint: self.entry_point.address,
        })
    }

    pub fn to_v07_safe_op(&self) -> Result<v07::SafeOp, OperationError> {
        Ok(v07::SafeOp {
            safe: self.sender,
            nonce: self.nonce,
            initCode: self.init_code(),
            callData: self.call_data.clone(),
            verificationGasLimit: self
                .narrow("verificationGasLimit", self.verification_gas_limit)?,
            callGasLimit: self.narrow("callGasLimit", self.call_gas_limit)?,
            preVerificationGas: self.pre_verification_gas,
            maxPriorityFeePerGas: self
                .narrow("maxPriorityFeePerGas", self.max_priority_fee_per_gas)?,
            maxFeePerGas: self.narrow("maxFeePerGas", self.max_fee_per_gas)?,
            paymasterAndData: self.paymaster_and_data()?,
            validAfter: self.validity.valid_after_u48()?,
            validUntil: self.validity.valid_until_u48()?,
            entryPoint: self.entry_point.address,
        })
    }
}

fn v06_signing_hash(op: &PendingOperation, domain: &Eip712Domain) -> Result<B256, OperationError> {
    Ok(op.to_v06_safe_op()?.eip712_signing_hash(domain))
}

fn v07_signing_hash(op: &PendingOperation, domain: &Eip712Domain) -> Result<B256, OperationError> {
    Ok(op.to_v07_safe_op()?.eip712_signing_hash(domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{EntryPoint, MAX_UINT48, ValidityWindow};
    use alloy_primitives::aliases::U48;
    use alloy_primitives::{Bytes, address, keccak256};
    use test_case::test_case;

    const MODULE: Address = address!("0x75cf11467937ce3F2f357CE24ffc3DBF8fD5c226");

    fn sample_operation(version: EntryPointVersion) -> PendingOperation {
        PendingOperation {
            sender: address!("0x1111111111111111111111111111111111111111"),
            nonce: U256::from(3),
            call_data: Bytes::from_static(&[0x01, 0x02]),
            call_gas_limit: U256::from(100_000),
            verification_gas_limit: U256::from(200_000),
            pre_verification_gas: U256::from(50_000),
            max_fee_per_gas: U256::from(30_000_000_000u64),
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            validity: ValidityWindow::new(10, 20).unwrap(),
            entry_point: EntryPoint::canonical(version),
            ..Default::default()
        }
    }

    #[test_case(
        EntryPointVersion::V06,
        "SafeOp(address safe,uint256 nonce,bytes initCode,bytes callData,uint256 callGasLimit,uint256 verificationGasLimit,uint256 preVerificationGas,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,bytes paymasterAndData,uint48 validAfter,uint48 validUntil,address entryPoint)"
        ; "v0.6 layout"
    )]
    #[test_case(
        EntryPointVersion::V07,
        "SafeOp(address safe,uint256 nonce,bytes initCode,bytes callData,uint128 verificationGasLimit,uint128 callGasLimit,uint256 preVerificationGas,uint128 maxPriorityFeePerGas,uint128 maxFeePerGas,bytes paymasterAndData,uint48 validAfter,uint48 validUntil,address entryPoint)"
        ; "v0.7 layout"
    )]
    fn test_scheme_type_strings(version: EntryPointVersion, expected: &str) {
        let scheme = scheme(version);
        assert_eq!(scheme.version, version);
        assert_eq!(scheme.encode_type(), expected);
    }

    #[test_case(EntryPointVersion::V06)]
    #[test_case(EntryPointVersion::V07)]
    fn test_safe_op_hash_matches_manual_eip712(version: EntryPointVersion) {
        let op = sample_operation(version);
        let domain = safe_op_domain(1, MODULE);

        let struct_hash = match version {
            EntryPointVersion::V06 => op.to_v06_safe_op().unwrap().eip712_hash_struct(),
            EntryPointVersion::V07 => op.to_v07_safe_op().unwrap().eip712_hash_struct(),
        };
        let expected = keccak256(
            [
                &[0x19, 0x01][..],
                domain.hash_struct().as_slice(),
                struct_hash.as_slice(),
            ]
            .concat(),
        );

        assert_eq!(op.safe_op_hash(1, MODULE).unwrap(), expected);
    }

    #[test]
    fn test_versions_hash_differently() {
        let v06 = sample_operation(EntryPointVersion::V06);
        let mut v07 = sample_operation(EntryPointVersion::V07);
        v07.entry_point.address = v06.entry_point.address;

        assert_ne!(
            v06.safe_op_hash(1, MODULE).unwrap(),
            v07.safe_op_hash(1, MODULE).unwrap()
        );
    }

    #[test]
    fn test_domain_has_no_name_or_version() {
        let domain = safe_op_domain(10, MODULE);
        assert!(domain.name.is_none());
        assert!(domain.version.is_none());
        assert_eq!(domain.verifying_contract, Some(MODULE));
        assert_ne!(
            domain.hash_struct(),
            safe_op_domain(11, MODULE).hash_struct()
        );
    }

    #[test]
    fn test_v07_rejects_wide_gas_fields() {
        let mut op = sample_operation(EntryPointVersion::V07);
        op.call_gas_limit = U256::from(u128::MAX) + U256::from(1);
        assert_eq!(
            op.safe_op_hash(1, MODULE),
            Err(OperationError::GasFieldOverflow {
                field: "callGasLimit",
                version: EntryPointVersion::V07,
            })
        );

        // v0.6 carries the same field at full width
        op.entry_point = EntryPoint::canonical(EntryPointVersion::V06);
        assert!(op.safe_op_hash(1, MODULE).is_ok());
    }

    #[test_case(EntryPointVersion::V06)]
    #[test_case(EntryPointVersion::V07)]
    fn test_validity_bounds_are_uint48(version: EntryPointVersion) {
        let mut op = sample_operation(version);
        op.validity = ValidityWindow::new(MAX_UINT48 - 1, MAX_UINT48).unwrap();
        let (valid_after, valid_until) = match version {
            EntryPointVersion::V06 => {
                let safe_op = op.to_v06_safe_op().unwrap();
                (safe_op.validAfter, safe_op.validUntil)
            }
            EntryPointVersion::V07 => {
                let safe_op = op.to_v07_safe_op().unwrap();
                (safe_op.validAfter, safe_op.validUntil)
            }
        };
        assert_eq!(valid_after, U48::try_from(MAX_UINT48 - 1).unwrap());
        assert_eq!(valid_until, U48::MAX);

        // the digest commits to the top bits of the window
        let wide = op.safe_op_hash(1, MODULE).unwrap();
        op.validity = ValidityWindow::new(MAX_UINT48 - 1, MAX_UINT48 & 0xff).unwrap();
        assert_ne!(op.safe_op_hash(1, MODULE).unwrap(), wide);
    }
}

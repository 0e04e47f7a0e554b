//! Safe 4337 user operation primitives: `SafeOp` hashing and owner signature aggregation.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod operation;
pub use operation::{EntryPoint, OperationError, Paymaster, PendingOperation, ValidityWindow};

pub mod safe_op;
pub use safe_op::{SafeOpScheme, safe_op_domain, scheme};

pub mod signature;
pub use signature::{
    AggregateError, AggregateState, AggregatedSignature, Proof, ProofData, SignatureAggregate,
    SigningMethod, aggregate,
};

pub use safe_contracts::EntryPointVersion;

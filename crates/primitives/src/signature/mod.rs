//! Owner proofs and their aggregation into the Safe signature format.

pub mod aggregate;
pub mod partial;
pub mod proof;

pub use aggregate::{
    AggregateError, AggregateState, AggregatedSignature, SignatureAggregate, aggregate,
};
pub use partial::{PartialDecodeError, decode_partial, encode_partial};
pub use proof::{
    ECDSA_SIGNATURE_LENGTH, Proof, ProofData, ProofError, SigningMethod, normalize_recovery_byte,
    recover_signer,
};

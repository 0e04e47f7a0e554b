use crate::{collector::CollectError, config::ConfigError, reader::ChainReadError};
use alloy_primitives::Address;
use safe_primitives::{AggregateError, OperationError};

/// Errors surfaced by account level operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ChainRead(#[from] ChainReadError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("signature from {0} who is not an owner of this account")]
    NotAnOwner(Address),
}

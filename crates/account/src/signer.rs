//! Multi-owner signing rounds.
//!
//! A round walks the owner list once, asks every owner this session can reach for a
//! proof, and merges the proofs into the aggregate carried by the caller. All progress
//! lives in the returned blob, so rounds can run on different devices in any order.

use crate::{
    collector::SignatureCollector,
    error::AccountError,
    owner::OwnerSet,
};
use alloy_primitives::{Address, Bytes};
use safe_primitives::{AggregatedSignature, PendingOperation, SignatureAggregate, aggregate};
use tracing::{debug, info};

/// Runs signing rounds for one owner set.
#[derive(Debug)]
pub struct OperationSigner<'a> {
    owners: &'a OwnerSet,
    addresses: Vec<Address>,
    collector: SignatureCollector,
}

impl<'a> OperationSigner<'a> {
    pub fn new(
        owners: &'a OwnerSet,
        collector: SignatureCollector,
        shared_signer: Option<Address>,
    ) -> Result<Self, AccountError> {
        Ok(Self {
            addresses: owners.addresses(shared_signer)?,
            owners,
            collector,
        })
    }

    /// Resume from `existing_partial` and collect every reachable owner's proof.
    ///
    /// Returns the packed signature once every owner has signed and the resumable
    /// partial encoding otherwise. On error the caller's blob stays valid.
    pub async fn sign(
        &self,
        op: &PendingOperation,
        existing_partial: Option<&[u8]>,
    ) -> Result<AggregatedSignature, AccountError> {
        let mut aggregate = self.resume(existing_partial)?;
        let digest = self.collector.digest(op)?;

        for (owner, address) in self.owners.owners().iter().zip(&self.addresses) {
            if aggregate.contains(address) {
                debug!(owner = %address, "already signed, skipping");
                continue;
            }
            if !owner.can_sign() {
                debug!(owner = %address, kind = owner.kind(), "not signable in this session");
                continue;
            }
            let proof = self.collector.collect_digest(owner, digest).await?;
            aggregate = aggregate.with_proof(proof)?;
        }

        info!(state = %aggregate.state(), signers = aggregate.len(), "signing round finished");
        Ok(aggregate.into_signature(op.validity)?)
    }

    /// Pack a partial blob as soon as it holds `threshold` proofs, without waiting for
    /// the remaining owners.
    pub fn finalize(
        &self,
        op: &PendingOperation,
        partial: &[u8],
    ) -> Result<Bytes, AccountError> {
        let aggregate = self.resume(Some(partial))?;
        Ok(aggregate.finalize(self.owners.threshold(), op.validity)?)
    }

    fn resume(&self, existing_partial: Option<&[u8]>) -> Result<SignatureAggregate, AccountError> {
        let aggregate = aggregate(existing_partial, None, self.addresses.len())?;
        if let Some(stranger) = aggregate.signers().find(|signer| !self.addresses.contains(signer)) {
            return Err(AccountError::NotAnOwner(*stranger));
        }
        Ok(aggregate)
    }
}

use crate::opts::{ConfigArgs, load_operation};
use alloy_primitives::Bytes;
use clap::Parser;
use eyre::Result;
use safe_account::SignatureCollector;
use safe_primitives::SignatureAggregate;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub(crate) struct InspectArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Partial or packed signature
    signature: Bytes,

    /// Number of account owners
    #[arg(long)]
    owners: usize,

    /// Operation the packed signature was produced for; without it the signature is
    /// decoded as a partial signature
    #[arg(short, long)]
    operation: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,
}

impl InspectArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let (validity, aggregate) = match &self.operation {
            Some(path) => {
                let config = self.config.resolve()?;
                let op = load_operation(path, &config)?;
                let digest = SignatureCollector::new(
                    config.chain_id,
                    config.deployment.safe_4337_module,
                    config.webauthn_shared_signer,
                )
                .digest(&op)?;
                let (validity, aggregate) =
                    SignatureAggregate::unpack(&self.signature, self.owners, digest)?;
                (Some(validity), aggregate)
            }
            None => (None, SignatureAggregate::from_partial(&self.signature, self.owners)?),
        };

        if self.format == "json" {
            let proofs: Vec<_> = aggregate
                .proofs()
                .map(|proof| {
                    serde_json::json!({
                        "signer": proof.signer,
                        "contractSignature": proof.data.is_dynamic(),
                        "data": Bytes::copy_from_slice(proof.data.as_bytes()),
                    })
                })
                .collect();
            let data = serde_json::json!({
                "state": aggregate.state().to_string(),
                "validAfter": validity.map(|v| v.valid_after()),
                "validUntil": validity.map(|v| v.valid_until()),
                "proofs": proofs,
            });
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!("Signature");
        println!("=========");
        println!();
        println!("State:    {}", aggregate.state());
        println!("Signers:  {} of {}", aggregate.len(), self.owners);
        if let Some(validity) = validity {
            println!("Valid after: {}", validity.valid_after());
            println!("Valid until: {}", validity.valid_until());
        }
        println!();
        for proof in aggregate.proofs() {
            let kind = if proof.data.is_dynamic() { "contract" } else { "ecdsa" };
            println!("  {} {kind} ({} bytes)", proof.signer, proof.data.as_bytes().len());
        }
        Ok(())
    }
}

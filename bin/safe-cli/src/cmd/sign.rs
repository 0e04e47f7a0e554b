use crate::opts::{AccountArgs, load_operation};
use alloy_primitives::Bytes;
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use eyre::Result;
use safe_account::owner::LocalOwner;
use safe_primitives::{AggregatedSignature, SigningMethod};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
pub(crate) struct SignArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Path to the operation JSON file
    #[arg(short, long)]
    operation: PathBuf,

    /// Private key of the owner signing in this session
    #[arg(long)]
    private_key: PrivateKeySigner,

    /// Sign the SafeOp hash as an EIP-191 personal message
    #[arg(long)]
    personal_sign: bool,

    /// Partial signature produced by earlier sessions
    #[arg(long)]
    partial: Option<Bytes>,

    /// Pack the signature as soon as the threshold is met
    #[arg(long)]
    finalize: bool,
}

impl SignArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let signature = self.sign().await?;
        info!(complete = signature.is_final(), "signature updated");
        let data = serde_json::json!({
            "final": signature.is_final(),
            "signature": signature.bytes(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }

    async fn sign(self) -> Result<AggregatedSignature> {
        let method = if self.personal_sign {
            SigningMethod::PersonalSign
        } else {
            SigningMethod::TypedData
        };
        let account = self
            .account
            .account(Some(LocalOwner {
                signer: self.private_key,
                method,
            }))
            .await?;
        let op = load_operation(&self.operation, account.config())?;

        let mut signature = account
            .sign_operation(&op, self.partial.as_ref().map(|partial| &partial[..]))
            .await?;
        if self.finalize
            && let AggregatedSignature::Partial(partial) = &signature
        {
            let packed = account.operation_signer()?.finalize(&op, partial)?;
            signature = AggregatedSignature::Final(packed);
        }
        Ok(signature)
    }
}

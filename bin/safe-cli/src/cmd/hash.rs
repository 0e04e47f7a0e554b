use crate::opts::{ConfigArgs, load_operation};
use clap::Parser;
use eyre::Result;
use safe_account::SignatureCollector;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub(crate) struct HashArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Path to the operation JSON file
    #[arg(short, long)]
    operation: PathBuf,
}

impl HashArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let op = load_operation(&self.operation, &config)?;

        let collector = SignatureCollector::new(
            config.chain_id,
            config.deployment.safe_4337_module,
            config.webauthn_shared_signer,
        );
        println!("{}", collector.digest(&op)?);
        Ok(())
    }
}

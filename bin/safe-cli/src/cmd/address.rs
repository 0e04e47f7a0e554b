use crate::opts::AccountArgs;
use clap::Parser;
use eyre::Result;

#[derive(Parser, Debug)]
pub(crate) struct AddressArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Also report whether the account is deployed (needs --rpc-url)
    #[arg(long)]
    check_deployed: bool,
}

impl AddressArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let account = self.account.account(None).await?;
        let address = account.address().await?;

        if self.check_deployed {
            let deployed = account.is_deployed().await?;
            println!("{address} (deployed: {deployed})");
        } else {
            println!("{address}");
        }
        Ok(())
    }
}

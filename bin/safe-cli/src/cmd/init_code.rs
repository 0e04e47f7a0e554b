use crate::opts::AccountArgs;
use clap::Parser;
use eyre::Result;

#[derive(Parser, Debug)]
pub(crate) struct InitCodeArgs {
    #[command(flatten)]
    account: AccountArgs,
}

impl InitCodeArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let account = self.account.account(None).await?;
        let sender = account.address().await?;

        let data = match account.factory_args().await? {
            Some(args) => serde_json::json!({
                "sender": sender,
                "factory": args.factory,
                "factoryData": args.factory_data,
            }),
            None => serde_json::json!({
                "sender": sender,
                "factory": null,
                "factoryData": "0x",
            }),
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}

use clap::Parser;
use opts::{SafeCli, SafeSubcommand};

mod cmd;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = SafeCli::parse();

    match args.cmd {
        SafeSubcommand::Address(cmd) => cmd.run().await,
        SafeSubcommand::InitCode(cmd) => cmd.run().await,
        SafeSubcommand::Hash(cmd) => cmd.run().await,
        SafeSubcommand::Sign(cmd) => cmd.run().await,
        SafeSubcommand::Inspect(cmd) => cmd.run().await,
    }
}

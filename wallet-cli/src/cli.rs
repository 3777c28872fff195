use clap::{Parser, Subcommand};
use hd_descriptors::Network;

#[derive(Parser, Debug)]
#[command(
    name = "wallet-cli",
    about = "Derives receiving and change addresses from output descriptors",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    #[command(name = "newaddrs")]
    NewAddrs(NewAddrsArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Generates new wallet addresses from a descriptor")]
pub(crate) struct NewAddrsArgs {
    #[arg(help = "the output script descriptor, e.g. wpkh(zpub.../*)")]
    pub(crate) descriptor: String,

    #[arg(
        long,
        env = "WALLET_CLI_NETWORK",
        default_value = "mainnet",
        value_parser = clap::value_parser!(Network),
        help = "the bitcoin network [mainnet|testnet|regtest]"
    )]
    pub(crate) network: Network,

    #[arg(long, default_value_t = 10, help = "how many addresses to generate")]
    pub(crate) num: u32,

    #[arg(long, default_value_t = 0, help = "index of the first address")]
    pub(crate) offset: u32,

    #[arg(long, help = "generate change addresses (branch 1) instead of receiving ones")]
    pub(crate) change: bool,
}

//! Command line front end printing addresses derived from an output
//! descriptor.

mod cli;
mod handlers;
mod logging;

use anyhow::{Error, Result};
use clap::Parser;

fn main() -> Result<(), Error> {
    logging::init("wallet-cli");

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::NewAddrs(args) => handlers::handle_newaddrs(args),
    }
}

//! Command handlers.

use std::io::{self, Write};

use anyhow::{anyhow, Result};
use hd_descriptors::Wallet;
use tracing::info;

use crate::cli::NewAddrsArgs;

/// Derivation path and address for each requested index, in order.
pub(crate) fn derive_addresses(args: &NewAddrsArgs) -> Result<Vec<(String, String)>> {
    let wallet = Wallet::new(&args.descriptor, args.network)?;
    // receiving addresses live on branch 0, change on branch 1
    let branch = if args.change { 1 } else { 0 };
    let end = args
        .offset
        .checked_add(args.num)
        .ok_or_else(|| anyhow!("offset {} + num {} overflows", args.offset, args.num))?;

    info!(
        network = %args.network,
        branch,
        offset = args.offset,
        num = args.num,
        "generating addresses"
    );

    (args.offset..end)
        .map(|index| -> Result<(String, String)> {
            let path = format!("m/{}/{}", branch, index);
            let address = wallet.path(&path)?.address()?;
            Ok((path, address))
        })
        .collect()
}

/// Handles the newaddrs command.
pub(crate) fn handle_newaddrs(args: NewAddrsArgs) -> Result<()> {
    let addresses = derive_addresses(&args)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (path, address) in addresses {
        writeln!(out, "{}: {}", path, address)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hd_descriptors::{Error, Network};

    use super::*;

    const ZPUB: &str = "zpub6u4KbU8TSgNuZSxzv7HaGq5Tk361gMHdZxnM4UYuwzg5CMLcNytzhobitV4Zq6vWtWHpG9QijsigkxAzXvQWyLRfLq1L7VxPP1tky1hPfD4";

    fn args(network: Network, num: u32, offset: u32, change: bool) -> NewAddrsArgs {
        NewAddrsArgs {
            descriptor: format!("wpkh({})", ZPUB),
            network,
            num,
            offset,
            change,
        }
    }

    #[test]
    fn receiving() {
        let got = derive_addresses(&args(Network::Mainnet, 3, 0, false)).unwrap();
        assert_eq!(
            got,
            vec![
                ("m/0/0".to_owned(), "bc1qffezsyp34463ka5tjrm5mt5g9rs5s5nlc3u43c".to_owned()),
                ("m/0/1".to_owned(), "bc1qe2lcwscs0cs2tcpm9r53c2gkmyyr6cm9szfz65".to_owned()),
                ("m/0/2".to_owned(), "bc1q5ngz3y56lmgrc0rx49ecxft4f3zh7uw3d4z2dz".to_owned()),
            ]
        );
    }

    #[test]
    fn change_with_offset() {
        let got = derive_addresses(&args(Network::Testnet, 2, 5, true)).unwrap();
        assert_eq!(
            got,
            vec![
                ("m/1/5".to_owned(), "tb1qj2v2cakhm2vp9tq9fnvavgqg0hu8583ez775wj".to_owned()),
                ("m/1/6".to_owned(), "tb1qmafrkf9vpwxwrfe6hyf9lcy9sk2tz4d46xfvns".to_owned()),
            ]
        );
    }

    #[test]
    fn zero_addresses() {
        assert!(derive_addresses(&args(Network::Mainnet, 0, 0, false))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn errors_surface() {
        let mut bad = args(Network::Mainnet, 1, 0, false);
        bad.descriptor = "wsh(sh(pkh(x)))".to_owned();
        let err = derive_addresses(&bad).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Grammar(_))));

        assert!(derive_addresses(&args(Network::Mainnet, 2, u32::MAX, false)).is_err());
    }
}

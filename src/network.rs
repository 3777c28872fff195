// SPDX-License-Identifier: CC0-1.0

//! Bitcoin networks and their address parameters.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The network an address is rendered for.
///
/// Each network fixes the Base58Check version bytes of legacy addresses and
/// the human-readable prefix of segwit addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(actual_serde::Serialize, actual_serde::Deserialize),
    serde(crate = "actual_serde", rename_all = "lowercase")
)]
pub enum Network {
    /// Bitcoin mainnet
    Mainnet,
    /// Bitcoin testnet
    Testnet,
    /// Local regression-test network
    Regtest,
}

impl Network {
    /// Version byte prefixed to a P2PKH hash in Base58Check
    pub const fn p2pkh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Regtest => 0x6f,
        }
    }

    /// Version byte prefixed to a P2SH hash in Base58Check
    pub const fn p2sh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet | Network::Regtest => 0xc4,
        }
    }

    /// Human-readable part of Bech32 segwit addresses
    pub const fn bech32_hrp(self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
            Network::Regtest => "bcrt",
        }
    }

    /// Lowercase network name, as accepted by [`FromStr`]
    pub const fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(Error::UnknownNetwork(s.to_owned())),
        }
    }
}

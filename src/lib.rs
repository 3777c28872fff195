// SPDX-License-Identifier: CC0-1.0

//! HD Output Descriptors
//!
//! # Introduction
//!
//! An *output script descriptor* is a short textual expression describing how
//! to build the script a wallet should be paid to, and which keys it commits
//! to. Because descriptors may carry BIP32 extended public keys, the same
//! descriptor describes a whole family of scripts, one per derivation index,
//! and wallet software can hand out receiving and change addresses without
//! ever touching a private key.
//!
//! This library parses a subset of the descriptor language (`sh`, `wsh`,
//! `pkh`, `wpkh`, `multi`, `sortedmulti` and a syntactic `tr`), derives every
//! key leaf along an optional external path, and evaluates the resulting
//! expression tree into a [`Script`]: the raw output script bytes plus a pure
//! function rendering its address on any [`Network`].
//!
//! # Examples
//!
//! ## Deriving an address from a descriptor
//!
//! ```rust
//! use hd_descriptors::Network;
//!
//! let script = hd_descriptors::parse(
//!     "pkh(03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e)",
//! )
//! .unwrap();
//! assert_eq!(
//!     script.address(Network::Mainnet).unwrap(),
//!     "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"
//! );
//! ```
//!
//! ## Walking the receive chain of an account
//!
//! ```rust
//! use hd_descriptors::Network;
//!
//! let desc = "wpkh(zpub6u4KbU8TSgNuZSxzv7HaGq5Tk361gMHdZxnM4UYuwzg5CMLcNytzhobitV4Zq6vWtWHpG9QijsigkxAzXvQWyLRfLq1L7VxPP1tky1hPfD4/*)";
//! let second = hd_descriptors::parse_with_path(desc, "m/1").unwrap();
//! assert_eq!(
//!     second.address(Network::Mainnet).unwrap(),
//!     "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g"
//! );
//! ```
//!
// Coding conventions
#![deny(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(missing_docs)]
#![warn(dead_code)]
#![warn(unused_imports)]

pub use bitcoin;
#[cfg(feature = "serde")]
pub use actual_serde as serde;

#[macro_use]
mod macros;

pub mod descriptor;
pub mod expression;
pub mod network;
pub mod script;
pub mod util;
pub mod wallet;

use std::str::FromStr;
use std::{error, fmt};

use bitcoin::secp256k1::Secp256k1;
use tracing::debug;

pub use crate::descriptor::{DerivationPath, Descriptor, DescriptorKey, ExtendedKey};
pub use crate::network::Network;
pub use crate::script::{Script, ScriptKind};
pub use crate::wallet::Wallet;

/// Parses a descriptor and evaluates it without any external derivation path.
///
/// Extended keys are still derived along the origin and suffix paths written
/// inside the descriptor itself.
pub fn parse(descriptor: &str) -> Result<Script, Error> {
    parse_with_path(descriptor, "")
}

/// Parses a descriptor and evaluates it, deriving every extended-key leaf
/// along `path` after the leaf's own embedded path.
///
/// An empty `path` means no external derivation. Otherwise it must be of the
/// form `m/0/5`, see [`DerivationPath`].
pub fn parse_with_path(descriptor: &str, path: &str) -> Result<Script, Error> {
    let desc = Descriptor::from_str(descriptor)?;
    let path = if path.is_empty() {
        None
    } else {
        Some(DerivationPath::from_str(path)?)
    };
    debug!(
        kind = ?desc.kind(),
        external_path = ?path.as_ref().map(ToString::to_string),
        "evaluating descriptor"
    );

    let secp = Secp256k1::new();
    desc.evaluate(&secp, path.as_ref())
}

/// Descriptor parsing, derivation and evaluation errors.
///
/// Every failure means the input was malformed; none of them is transient and
/// none is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The descriptor text does not follow the grammar: unknown operator,
    /// misplaced `sh`/`tr`, wrong number of arguments, bad threshold
    Grammar(String),
    /// A key is empty, not hex, has the wrong length, fails its Base58Check
    /// checksum or carries unknown version bytes
    KeyFormat(String),
    /// A derivation path is malformed
    PathFormat(String),
    /// A hardened step (index with the high bit set) was requested on a key
    /// without private material
    UnsupportedDerivation(u32),
    /// Bech32 encoding of a witness program failed
    Encoding(String),
    /// The requested rendering is not implemented for this script kind
    Unimplemented(&'static str),
    /// A network name other than `mainnet`, `testnet` or `regtest`
    UnknownNetwork(String),
}

pub(crate) fn errstr(s: &str) -> Error {
    Error::Grammar(format!("unexpected «{}»", s))
}

// Bound on tokenizer nesting, see `expression::Tree`.
const MAX_RECURSION_DEPTH: u32 = 402;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Grammar(ref s) => write!(f, "invalid descriptor: {}", s),
            Error::KeyFormat(ref s) => write!(f, "invalid key: {}", s),
            Error::PathFormat(ref s) => write!(f, "invalid derivation path: {}", s),
            Error::UnsupportedDerivation(index) => write!(
                f,
                "cannot derive hardened child {}' from a public key",
                index & !HARDENED_BIT
            ),
            Error::Encoding(ref s) => write!(f, "address encoding: {}", s),
            Error::Unimplemented(what) => write!(f, "{} is not implemented", what),
            Error::UnknownNetwork(ref s) => write!(f, "unknown network «{}»", s),
        }
    }
}

const HARDENED_BIT: u32 = 1 << 31;

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        use self::Error::*;

        match self {
            Grammar(_)
            | KeyFormat(_)
            | PathFormat(_)
            | UnsupportedDerivation(_)
            | Encoding(_)
            | Unimplemented(_)
            | UnknownNetwork(_) => None,
        }
    }
}

#[doc(hidden)]
impl From<bitcoin::bip32::Error> for Error {
    fn from(e: bitcoin::bip32::Error) -> Error {
        Error::KeyFormat(e.to_string())
    }
}

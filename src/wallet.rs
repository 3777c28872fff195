// SPDX-License-Identifier: CC0-1.0

//! # Wallet
//!
//! A thin address manager over a descriptor: it remembers the network and an
//! external derivation path, and re-runs the evaluation on every request.

use std::str::FromStr;

use bitcoin::bip32::ChildNumber;
use bitcoin::secp256k1::{All, Secp256k1};
use tracing::debug;

use crate::descriptor::{DerivationPath, Descriptor};
use crate::network::Network;
use crate::script::Script;
use crate::Error;

/// A descriptor bound to a network and an external derivation path.
///
/// ```rust
/// use hd_descriptors::{Network, Wallet};
///
/// let account = Wallet::new(
///     "wpkh(zpub6u4KbU8TSgNuZSxzv7HaGq5Tk361gMHdZxnM4UYuwzg5CMLcNytzhobitV4Zq6vWtWHpG9QijsigkxAzXvQWyLRfLq1L7VxPP1tky1hPfD4/*)",
///     Network::Mainnet,
/// )
/// .unwrap();
/// assert_eq!(
///     account.child(2).address().unwrap(),
///     "bc1qp59yckz4ae5c4efgw2s5wfyvrz0ala7rgvuz8z"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Wallet {
    descriptor: Descriptor,
    network: Network,
    path: Option<DerivationPath>,
    secp: Secp256k1<All>,
}

impl Wallet {
    /// Parses `descriptor`; no external path is applied yet.
    pub fn new(descriptor: &str, network: Network) -> Result<Wallet, Error> {
        Ok(Wallet {
            descriptor: Descriptor::from_str(descriptor)?,
            network,
            path: None,
            secp: Secp256k1::new(),
        })
    }

    /// The parsed descriptor
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Network addresses are rendered for
    pub fn network(&self) -> Network {
        self.network
    }

    /// External path applied to every extended key, if any
    pub fn external_path(&self) -> Option<&DerivationPath> {
        self.path.as_ref()
    }

    /// Evaluates the descriptor at the current path.
    pub fn script(&self) -> Result<Script, Error> {
        self.descriptor.evaluate(&self.secp, self.path.as_ref())
    }

    /// Address of [`Wallet::script`] on the wallet's network.
    pub fn address(&self) -> Result<String, Error> {
        self.script()?.address(self.network)
    }

    /// The wallet one level down, at child `index` of the current path.
    ///
    /// Indices from 2^31 up are hardened and only derive on private keys.
    pub fn child(&self, index: u32) -> Wallet {
        let base = self.path.clone().unwrap_or_default();
        let path = base.child(ChildNumber::from(index));
        debug!(%path, "deriving wallet child");
        self.with_path(path)
    }

    /// The wallet at `path` below the current path, e.g. `m/0/7`.
    pub fn path(&self, path: &str) -> Result<Wallet, Error> {
        let suffix = DerivationPath::from_str(path)?;
        let path = match self.path {
            Some(ref base) => base.extend(&suffix),
            None => suffix,
        };
        debug!(%path, "deriving wallet path");
        Ok(self.with_path(path))
    }

    fn with_path(&self, path: DerivationPath) -> Wallet {
        Wallet {
            descriptor: self.descriptor.clone(),
            network: self.network,
            path: Some(path),
            secp: self.secp.clone(),
        }
    }
}

// SPDX-License-Identifier: CC0-1.0

//! # Output Descriptors
//!
//! Tools for representing Bitcoin output scripts as descriptor strings and
//! turning them into scripts and addresses.
//!
//! The supported grammar is
//!
//! ```text
//! descriptor := sh(script) | wsh(script) | script | tr(KEY[,TREE])
//! script     := wsh(script) | pkh(KEY) | wpkh(KEY)
//!             | multi(k,KEY,...) | sortedmulti(k,KEY,...)
//! ```
//!
//! `sh` and `tr` may only appear at the top, and `wsh` may not wrap another
//! `wsh`. Whitespace anywhere in the text is ignored.

use std::fmt;
use std::str::FromStr;

use bitcoin::secp256k1::{PublicKey, Secp256k1, Signing, Verification};

use crate::expression::{self, FromTree};
use crate::script::{Script, ScriptKind};
use crate::Error;

pub mod key;
pub mod path;
mod tr;

pub use self::key::{
    parse_extended_key, parse_pub_key, DescriptorKey, DescriptorXKey, ExtendedKey, KeyFamily,
    KeyOrigin, SinglePub,
};
pub use self::path::{DerivationPath, Wildcard};
pub use self::tr::Tr;

/// Largest number of keys in a `multi`/`sortedmulti`
pub const MAX_MULTI_KEYS: usize = 16;

/// A `k`-of-`n` list of keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multi {
    k: usize,
    keys: Vec<DescriptorKey>,
}

fn check_threshold(k: usize, n: usize) -> Result<(), Error> {
    if n < 2 {
        return Err(Error::Grammar(format!(
            "multisig with {} keys, at least 2 required",
            n
        )));
    }
    if n > MAX_MULTI_KEYS {
        return Err(Error::Grammar(format!(
            "multisig with {} keys, at most {} allowed",
            n, MAX_MULTI_KEYS
        )));
    }
    if k < 2 || k > n {
        return Err(Error::Grammar(format!(
            "threshold {} out of range for {} keys",
            k, n
        )));
    }
    Ok(())
}

impl Multi {
    /// Creates a `k`-of-`keys.len()` multisig, checking `2 <= k <= n <= 16`.
    pub fn new(k: usize, keys: Vec<DescriptorKey>) -> Result<Self, Error> {
        check_threshold(k, keys.len())?;
        Ok(Multi { k, keys })
    }

    /// Number of required signatures
    pub fn threshold(&self) -> usize {
        self.k
    }

    /// Keys in the order they were written
    pub fn keys(&self) -> &[DescriptorKey] {
        &self.keys
    }

    fn resolve<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        external: Option<&DerivationPath>,
    ) -> Result<Vec<PublicKey>, Error> {
        self.keys
            .iter()
            .map(|key| key.resolve(secp, external))
            .collect()
    }

    fn fmt_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.k)?;
        for key in &self.keys {
            write!(f, ",{}", key)?;
        }
        Ok(())
    }
}

impl FromTree for Multi {
    fn from_tree(top: &expression::Tree<'_>) -> Result<Self, Error> {
        if top.args.len() < 2 {
            return Err(Error::Grammar(format!(
                "{}() needs a threshold and at least one key",
                top.name
            )));
        }
        // Counts are checked before any key is parsed.
        let k = expression::terminal(&top.args[0], expression::parse_num::<usize>)?;
        check_threshold(k, top.args.len() - 1)?;

        let keys = top.args[1..]
            .iter()
            .map(|arg| expression::terminal(arg, DescriptorKey::from_str))
            .collect::<Result<Vec<_>, _>>()?;
        Multi::new(k, keys)
    }
}

/// Script descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    /// Pay-to-script-hash
    Sh(Box<Descriptor>),
    /// Pay-to-witness-script-hash
    Wsh(Box<Descriptor>),
    /// Pay-to-pubkey-hash
    Pkh(DescriptorKey),
    /// Pay-to-witness-pubkey-hash
    Wpkh(DescriptorKey),
    /// Multisig with keys in the written order
    Multi(Multi),
    /// Multisig with keys sorted after resolution
    SortedMulti(Multi),
    /// Taproot, key only
    Tr(Tr),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    InsideSh,
    InsideWsh,
}

impl Descriptor {
    /// Template of the outermost script
    pub fn kind(&self) -> ScriptKind {
        match *self {
            Descriptor::Sh(_) => ScriptKind::P2sh,
            Descriptor::Wsh(_) => ScriptKind::P2wsh,
            Descriptor::Pkh(_) => ScriptKind::P2pkh,
            Descriptor::Wpkh(_) => ScriptKind::P2wpkh,
            Descriptor::Multi(_) | Descriptor::SortedMulti(_) => ScriptKind::BareMulti,
            Descriptor::Tr(_) => ScriptKind::Tr,
        }
    }

    /// Evaluates the descriptor into an output script.
    ///
    /// Every extended key is derived along its own path, then along
    /// `external` when given. Key errors from any leaf are returned as is.
    pub fn evaluate<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        external: Option<&DerivationPath>,
    ) -> Result<Script, Error> {
        match *self {
            Descriptor::Sh(ref inner) => Ok(Script::p2sh(&inner.evaluate(secp, external)?)),
            Descriptor::Wsh(ref inner) => Ok(Script::p2wsh(&inner.evaluate(secp, external)?)),
            Descriptor::Pkh(ref key) => Ok(Script::p2pkh(&key.resolve(secp, external)?)),
            Descriptor::Wpkh(ref key) => Ok(Script::p2wpkh(&key.resolve(secp, external)?)),
            Descriptor::Multi(ref multi) => {
                Ok(Script::multi(multi.k, &multi.resolve(secp, external)?))
            }
            Descriptor::SortedMulti(ref multi) => {
                let mut keys = multi.resolve(secp, external)?;
                keys.sort_by_key(PublicKey::serialize);
                Ok(Script::multi(multi.k, &keys))
            }
            Descriptor::Tr(ref tr) => {
                tr.internal_key().resolve(secp, external)?;
                Ok(Script::tr())
            }
        }
    }

    fn from_tree_at(top: &expression::Tree<'_>, position: Position) -> Result<Self, Error> {
        match (top.name, top.args.len()) {
            ("sh", 1) => {
                if position != Position::Top {
                    return Err(Error::Grammar("sh() must be top-level".to_owned()));
                }
                let inner = Descriptor::from_tree_at(&top.args[0], Position::InsideSh)?;
                Ok(Descriptor::Sh(Box::new(inner)))
            }
            ("wsh", 1) => {
                if position == Position::InsideWsh {
                    return Err(Error::Grammar("wsh() cannot be nested in wsh()".to_owned()));
                }
                let inner = Descriptor::from_tree_at(&top.args[0], Position::InsideWsh)?;
                Ok(Descriptor::Wsh(Box::new(inner)))
            }
            ("pkh", 1) => Ok(Descriptor::Pkh(expression::terminal(
                &top.args[0],
                DescriptorKey::from_str,
            )?)),
            ("wpkh", 1) => Ok(Descriptor::Wpkh(expression::terminal(
                &top.args[0],
                DescriptorKey::from_str,
            )?)),
            ("sh", n) | ("wsh", n) | ("pkh", n) | ("wpkh", n) => Err(Error::Grammar(format!(
                "{}() takes 1 argument, {} given",
                top.name, n
            ))),
            ("multi", _) => Ok(Descriptor::Multi(Multi::from_tree(top)?)),
            ("sortedmulti", _) => Ok(Descriptor::SortedMulti(Multi::from_tree(top)?)),
            ("tr", _) => {
                if position != Position::Top {
                    return Err(Error::Grammar("tr() must be top-level".to_owned()));
                }
                Ok(Descriptor::Tr(Tr::from_tree(top)?))
            }
            _ => Err(Error::Grammar(format!("invalid op «{}»", top.name))),
        }
    }
}

impl FromTree for Descriptor {
    fn from_tree(top: &expression::Tree<'_>) -> Result<Self, Error> {
        Descriptor::from_tree_at(top, Position::Top)
    }
}

impl FromStr for Descriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let top = expression::Tree::from_str(&stripped)?;
        Descriptor::from_tree(&top)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Descriptor::Sh(ref inner) => write!(f, "sh({})", inner),
            Descriptor::Wsh(ref inner) => write!(f, "wsh({})", inner),
            Descriptor::Pkh(ref key) => write!(f, "pkh({})", key),
            Descriptor::Wpkh(ref key) => write!(f, "wpkh({})", key),
            Descriptor::Multi(ref multi) => {
                f.write_str("multi(")?;
                multi.fmt_args(f)?;
                f.write_str(")")
            }
            Descriptor::SortedMulti(ref multi) => {
                f.write_str("sortedmulti(")?;
                multi.fmt_args(f)?;
                f.write_str(")")
            }
            Descriptor::Tr(ref tr) => write!(f, "{}", tr),
        }
    }
}

serde_string_impl!(Descriptor, "a script descriptor");

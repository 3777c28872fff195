// SPDX-License-Identifier: CC0-1.0

//! # Descriptor keys
//!
//! A key expression inside a descriptor is either a compressed public key in
//! hex, or a BIP32 extended key optionally preceded by an origin
//! `[fingerprint/path]` and followed by a derivation suffix `/1/2/*`.
//!
//! Extended keys are read in any of the SLIP-132 encodings (`xpub`, `ypub`,
//! `zpub` and their testnet and private counterparts). Private keys only take
//! part in derivation; what leaves a resolved key is always a public point.

use std::fmt;
use std::str::FromStr;

use bitcoin::base58;
use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::secp256k1::{PublicKey, Secp256k1, Signing, Verification};
use tracing::trace;

use super::path::DerivationPath;
use crate::Error;

/// Length of a serialized BIP32 node
const EXTENDED_KEY_LEN: usize = 78;

/// Script family announced by the version bytes of an extended key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// `xpub`/`tpub` (BIP44)
    Legacy,
    /// `ypub`/`upub` (BIP49)
    NestedSegwit,
    /// `zpub`/`vpub` (BIP84)
    NativeSegwit,
}

fn version_bytes(testnet: bool, private: bool, family: KeyFamily) -> [u8; 4] {
    match (testnet, private, family) {
        (false, false, KeyFamily::Legacy) => [0x04, 0x88, 0xb2, 0x1e],
        (false, true, KeyFamily::Legacy) => [0x04, 0x88, 0xad, 0xe4],
        (false, false, KeyFamily::NestedSegwit) => [0x04, 0x9d, 0x7c, 0xb2],
        (false, true, KeyFamily::NestedSegwit) => [0x04, 0x9d, 0x78, 0x78],
        (false, false, KeyFamily::NativeSegwit) => [0x04, 0xb2, 0x47, 0x46],
        (false, true, KeyFamily::NativeSegwit) => [0x04, 0xb2, 0x43, 0x0c],
        (true, false, KeyFamily::Legacy) => [0x04, 0x35, 0x87, 0xcf],
        (true, true, KeyFamily::Legacy) => [0x04, 0x35, 0x83, 0x94],
        (true, false, KeyFamily::NestedSegwit) => [0x04, 0x4a, 0x52, 0x62],
        (true, true, KeyFamily::NestedSegwit) => [0x04, 0x4a, 0x4e, 0x28],
        (true, false, KeyFamily::NativeSegwit) => [0x04, 0x5f, 0x1c, 0xf6],
        (true, true, KeyFamily::NativeSegwit) => [0x04, 0x5f, 0x18, 0xbc],
    }
}

/// Inverse of [`version_bytes`]: `(testnet, private, family)`
fn decode_version(bytes: [u8; 4]) -> Option<(bool, bool, KeyFamily)> {
    let families = [
        KeyFamily::Legacy,
        KeyFamily::NestedSegwit,
        KeyFamily::NativeSegwit,
    ];
    for &family in &families {
        for &testnet in &[false, true] {
            for &private in &[false, true] {
                if version_bytes(testnet, private, family) == bytes {
                    return Some((testnet, private, family));
                }
            }
        }
    }
    None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Node {
    Public(Xpub),
    Private(Xpriv),
}

/// A BIP32 node, public or private, remembering the SLIP-132 family it was
/// written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedKey {
    node: Node,
    family: KeyFamily,
}

impl ExtendedKey {
    /// Whether the node carries a private key
    pub fn is_private(&self) -> bool {
        match self.node {
            Node::Public(_) => false,
            Node::Private(_) => true,
        }
    }

    /// Whether the version bytes are those of a testnet family
    pub fn is_testnet(&self) -> bool {
        let network = match self.node {
            Node::Public(ref xpub) => xpub.network,
            Node::Private(ref xpriv) => xpriv.network,
        };
        network != bitcoin::Network::Bitcoin
    }

    /// The SLIP-132 family of the encoding
    pub fn family(&self) -> KeyFamily {
        self.family
    }

    /// Number of derivation steps from the master node
    pub fn depth(&self) -> u8 {
        match self.node {
            Node::Public(ref xpub) => xpub.depth,
            Node::Private(ref xpriv) => xpriv.depth,
        }
    }

    /// The public key of this node, without further derivation
    pub fn public_key<C: Signing>(&self, secp: &Secp256k1<C>) -> PublicKey {
        match self.node {
            Node::Public(ref xpub) => xpub.public_key,
            Node::Private(ref xpriv) => xpriv.private_key.public_key(secp),
        }
    }

    /// Hex of the compressed public key of this node
    pub fn to_pub_key_hex<C: Signing>(&self, secp: &Secp256k1<C>) -> String {
        self.public_key(secp).to_string()
    }

    /// Drops the private key, keeping chain code, depth and family.
    pub fn neutered<C: Signing>(&self, secp: &Secp256k1<C>) -> ExtendedKey {
        match self.node {
            Node::Public(_) => *self,
            Node::Private(ref xpriv) => ExtendedKey {
                node: Node::Public(Xpub::from_priv(secp, xpriv)),
                family: self.family,
            },
        }
    }

    /// Walks `path` one step at a time. A trailing placeholder is skipped.
    ///
    /// Hardened steps need the private key: on a public node they fail with
    /// [`Error::UnsupportedDerivation`].
    pub fn derive<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        path: &DerivationPath,
    ) -> Result<ExtendedKey, Error> {
        let mut key = *self;
        for &child in path.steps() {
            key = key.ckd(secp, child)?;
        }
        Ok(key)
    }

    /// Public key of the child `index`; indices with the top bit set are
    /// hardened and need a private key.
    pub fn child_pub_key<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        index: u32,
    ) -> Result<PublicKey, Error> {
        Ok(self.ckd(secp, ChildNumber::from(index))?.public_key(secp))
    }

    fn ckd<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        child: ChildNumber,
    ) -> Result<ExtendedKey, Error> {
        if self.depth() == u8::MAX {
            return Err(Error::PathFormat(
                "derivation deeper than 255 levels".to_owned(),
            ));
        }
        let node = match self.node {
            Node::Public(ref xpub) => {
                if child.is_hardened() {
                    return Err(Error::UnsupportedDerivation(u32::from(child)));
                }
                Node::Public(xpub.ckd_pub(secp, child)?)
            }
            Node::Private(ref xpriv) => Node::Private(xpriv.derive_priv(secp, &[child])?),
        };
        Ok(ExtendedKey {
            node,
            family: self.family,
        })
    }
}

impl FromStr for ExtendedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Never echo `s` back: it may be a private key.
        let mut data = base58::decode_check(s)
            .map_err(|e| Error::KeyFormat(format!("extended key: {}", e)))?;
        if data.len() != EXTENDED_KEY_LEN {
            return Err(Error::KeyFormat(format!(
                "extended key payload is {} bytes, expected {}",
                data.len(),
                EXTENDED_KEY_LEN
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&data[..4]);
        let (testnet, private, family) = decode_version(prefix).ok_or_else(|| {
            Error::KeyFormat(format!(
                "unknown extended key version {}",
                hex::encode(prefix)
            ))
        })?;

        // rust-bitcoin only knows the xpub/tpub versions
        data[..4].copy_from_slice(&version_bytes(testnet, private, KeyFamily::Legacy));
        let node = if private {
            Node::Private(Xpriv::decode(&data)?)
        } else {
            Node::Public(Xpub::decode(&data)?)
        };
        Ok(ExtendedKey { node, family })
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = match self.node {
            Node::Public(ref xpub) => xpub.encode(),
            Node::Private(ref xpriv) => xpriv.encode(),
        };
        data[..4].copy_from_slice(&version_bytes(
            self.is_testnet(),
            self.is_private(),
            self.family,
        ));
        f.write_str(&base58::encode_check(&data))
    }
}

/// The `[fingerprint/path]` prefix of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyOrigin {
    /// Fingerprint of the master key
    pub fingerprint: [u8; 4],
    /// Path from the master key to the key that follows
    pub path: DerivationPath,
}

impl fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", hex::encode(self.fingerprint))?;
        fmt_path_suffix(f, &self.path)?;
        f.write_str("]")
    }
}

/// A compressed public key written directly in the descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinglePub {
    /// Origin information
    pub origin: Option<KeyOrigin>,
    /// The public key
    pub key: PublicKey,
}

/// An extended key with origin and derivation suffix
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorXKey {
    /// Origin information
    pub origin: Option<KeyOrigin>,
    /// The extended key
    pub xkey: ExtendedKey,
    /// The path written after the key, e.g. `/0/*`
    pub derivation_path: DerivationPath,
}

impl DescriptorXKey {
    /// The key derived along the origin path, then along the suffix path.
    pub fn derived<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
    ) -> Result<ExtendedKey, Error> {
        let mut key = self.xkey;
        if let Some(ref origin) = self.origin {
            key = key.derive(secp, &origin.path)?;
        }
        key.derive(secp, &self.derivation_path)
    }
}

/// A key expression, as found in a descriptor leaf
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorKey {
    /// Compressed public key in hex
    Single(SinglePub),
    /// Extended key
    XKey(DescriptorXKey),
}

impl DescriptorKey {
    /// Whether the key is extended and written in a private encoding
    pub fn is_private(&self) -> bool {
        match *self {
            DescriptorKey::Single(_) => false,
            DescriptorKey::XKey(ref xkey) => xkey.xkey.is_private(),
        }
    }

    /// Computes the public key this expression stands for.
    ///
    /// Extended keys are derived along their origin path, their own suffix
    /// and then `external`, in that order. Raw keys ignore every path.
    pub fn resolve<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        external: Option<&DerivationPath>,
    ) -> Result<PublicKey, Error> {
        match *self {
            DescriptorKey::Single(ref single) => {
                trace!(key = %single.key, "raw key");
                Ok(single.key)
            }
            DescriptorKey::XKey(ref xkey) => {
                let mut key = xkey.derived(secp)?;
                if let Some(path) = external {
                    key = key.derive(secp, path)?;
                }
                let public_key = key.public_key(secp);
                trace!(depth = key.depth(), key = %public_key, "resolved extended key");
                Ok(public_key)
            }
        }
    }
}

impl FromStr for DescriptorKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_part, origin) = parse_origin(s)?;
        if key_part.is_empty() {
            return Err(Error::KeyFormat("no key after origin".to_owned()));
        }

        if key_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            let key = parse_pub_key(key_part)?;
            Ok(DescriptorKey::Single(SinglePub { origin, key }))
        } else {
            let mut parts = key_part.split('/');
            let xkey = ExtendedKey::from_str(parts.next().unwrap_or(""))?;
            let derivation_path = DerivationPath::from_segments(parts)?;
            Ok(DescriptorKey::XKey(DescriptorXKey {
                origin,
                xkey,
                derivation_path,
            }))
        }
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DescriptorKey::Single(ref single) => {
                if let Some(ref origin) = single.origin {
                    write!(f, "{}", origin)?;
                }
                write!(f, "{}", single.key)
            }
            DescriptorKey::XKey(ref xkey) => {
                if let Some(ref origin) = xkey.origin {
                    write!(f, "{}", origin)?;
                }
                write!(f, "{}", xkey.xkey)?;
                fmt_path_suffix(f, &xkey.derivation_path)
            }
        }
    }
}

/// Writes `path` without its leading `m`.
fn fmt_path_suffix(f: &mut fmt::Formatter<'_>, path: &DerivationPath) -> fmt::Result {
    let s = path.to_string();
    f.write_str(&s[1..])
}

/// Splits off a leading `[fingerprint/path]`, returning the rest of the key.
fn parse_origin(s: &str) -> Result<(&str, Option<KeyOrigin>), Error> {
    if s.is_empty() {
        return Err(Error::KeyFormat("public key can't be empty".to_owned()));
    }
    let inner = match s.strip_prefix('[') {
        Some(inner) => inner,
        None => return Ok((s, None)),
    };
    let close = inner
        .find(']')
        .ok_or_else(|| Error::KeyFormat("unclosed «[»".to_owned()))?;
    let key = &inner[close + 1..];
    if key.contains(']') {
        return Err(Error::KeyFormat("multiple «]» in key".to_owned()));
    }

    let mut raw_origin = inner[..close].split('/');
    let fingerprint_hex = raw_origin.next().unwrap_or("");
    if fingerprint_hex.len() != 8 {
        return Err(Error::KeyFormat(
            "master fingerprint should be 8 characters long".to_owned(),
        ));
    }
    let mut fingerprint = [0u8; 4];
    hex::decode_to_slice(fingerprint_hex, &mut fingerprint).map_err(|_| {
        Error::KeyFormat("malformed master fingerprint, expected 8 hex chars".to_owned())
    })?;
    let path = DerivationPath::from_segments(raw_origin)?;
    if path.wildcard() != super::path::Wildcard::None {
        return Err(Error::PathFormat("'*' is not allowed in a key origin".to_owned()));
    }

    Ok((key, Some(KeyOrigin { fingerprint, path })))
}

/// Parses a compressed public key from 66 hex characters.
pub fn parse_pub_key(s: &str) -> Result<PublicKey, Error> {
    if s.is_empty() {
        return Err(Error::KeyFormat("public key can't be empty".to_owned()));
    }
    let bytes = hex::decode(s)
        .map_err(|e| Error::KeyFormat(format!("«{}» is not hex: {}", s, e)))?;
    if bytes.len() != 33 {
        return Err(Error::KeyFormat(format!(
            "public key is {} bytes, expected 33",
            bytes.len()
        )));
    }
    PublicKey::from_slice(&bytes)
        .map_err(|e| Error::KeyFormat(format!("«{}»: {}", s, e)))
}

/// Parses an extended key with optional origin and suffix, and derives it
/// along both.
pub fn parse_extended_key<C: Signing + Verification>(
    secp: &Secp256k1<C>,
    s: &str,
) -> Result<ExtendedKey, Error> {
    match DescriptorKey::from_str(s)? {
        DescriptorKey::XKey(xkey) => xkey.derived(secp),
        DescriptorKey::Single(_) => Err(Error::KeyFormat(
            "expected an extended key, found a raw public key".to_owned(),
        )),
    }
}

// SPDX-License-Identifier: CC0-1.0

//! # Output scripts
//!
//! The result of evaluating a descriptor: the script bytes, computed eagerly,
//! and whatever is needed to render an address for any [`Network`] later
//! without touching keys again.

use bitcoin::opcodes::all::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_PUSHBYTES_0,
    OP_PUSHNUM_1,
};
use bitcoin::secp256k1::PublicKey;
use bitcoin::ScriptBuf;

use crate::network::Network;
use crate::util::{encode_base58_address, encode_segwit_address, hash160, sha256};
use crate::Error;

/// Template an output script was built from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// `pkh(KEY)`
    P2pkh,
    /// `sh(SCRIPT)`
    P2sh,
    /// `wpkh(KEY)`
    P2wpkh,
    /// `wsh(SCRIPT)`
    P2wsh,
    /// Top-level `multi`/`sortedmulti`
    BareMulti,
    /// `tr(KEY[,TREE])`, not evaluated
    Tr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Payload {
    PubkeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessV0(Vec<u8>),
    None,
}

/// An evaluated output script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    bytes: Vec<u8>,
    kind: ScriptKind,
    payload: Payload,
}

/// Opcode pushing the small integer `n`.
///
/// # Panics
///
/// If `n` is not in `2..=16`.
pub fn op_n(n: usize) -> u8 {
    assert!((2..=16).contains(&n), "OP_N operand {} out of range", n);
    OP_PUSHNUM_1.to_u8() + (n as u8 - 1)
}

/// Opcode pushing the next `n` bytes.
///
/// # Panics
///
/// If `n` is not in `1..=75`.
pub fn op_push_bytes(n: usize) -> u8 {
    assert!((1..=75).contains(&n), "push of {} bytes out of range", n);
    n as u8
}

fn push_slice(bytes: &mut Vec<u8>, data: &[u8]) {
    bytes.push(op_push_bytes(data.len()));
    bytes.extend_from_slice(data);
}

impl Script {
    /// `OP_DUP OP_HASH160 <hash160(key)> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(key: &PublicKey) -> Script {
        let hash = hash160(&key.serialize());
        let mut bytes = vec![OP_DUP.to_u8(), OP_HASH160.to_u8()];
        push_slice(&mut bytes, &hash);
        bytes.push(OP_EQUALVERIFY.to_u8());
        bytes.push(OP_CHECKSIG.to_u8());
        Script {
            bytes,
            kind: ScriptKind::P2pkh,
            payload: Payload::PubkeyHash(hash),
        }
    }

    /// `OP_0 <hash160(key)>`
    pub fn p2wpkh(key: &PublicKey) -> Script {
        let hash = hash160(&key.serialize());
        Script::witness_v0(&hash, ScriptKind::P2wpkh)
    }

    /// `OP_HASH160 <hash160(inner)> OP_EQUAL`
    pub fn p2sh(inner: &Script) -> Script {
        let hash = hash160(&inner.bytes);
        let mut bytes = vec![OP_HASH160.to_u8()];
        push_slice(&mut bytes, &hash);
        bytes.push(OP_EQUAL.to_u8());
        Script {
            bytes,
            kind: ScriptKind::P2sh,
            payload: Payload::ScriptHash(hash),
        }
    }

    /// `OP_0 <sha256(inner)>`
    pub fn p2wsh(inner: &Script) -> Script {
        Script::witness_v0(&sha256(&inner.bytes), ScriptKind::P2wsh)
    }

    fn witness_v0(program: &[u8], kind: ScriptKind) -> Script {
        let mut bytes = vec![OP_PUSHBYTES_0.to_u8()];
        push_slice(&mut bytes, program);
        Script {
            bytes,
            kind,
            payload: Payload::WitnessV0(program.to_vec()),
        }
    }

    /// `OP_k <key>... OP_n OP_CHECKMULTISIG`, keys in the given order.
    ///
    /// # Panics
    ///
    /// If `threshold` or the number of keys is outside `2..=16`.
    pub fn multi(threshold: usize, keys: &[PublicKey]) -> Script {
        let mut bytes = Vec::with_capacity(3 + 34 * keys.len());
        bytes.push(op_n(threshold));
        for key in keys {
            push_slice(&mut bytes, &key.serialize());
        }
        bytes.push(op_n(keys.len()));
        bytes.push(OP_CHECKMULTISIG.to_u8());
        Script {
            bytes,
            kind: ScriptKind::BareMulti,
            payload: Payload::None,
        }
    }

    /// Placeholder for `tr()`: no bytes, no address.
    pub fn tr() -> Script {
        Script {
            bytes: vec![],
            kind: ScriptKind::Tr,
            payload: Payload::None,
        }
    }

    /// Raw script bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Script bytes in hex
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Template this script was built from
    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    /// The script as a rust-bitcoin `ScriptBuf`
    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::from(self.bytes.clone())
    }

    /// Renders the address paying to this script on `network`.
    ///
    /// A bare multisig has no address form and yields an empty string. The
    /// address of a `tr()` script is not implemented.
    pub fn address(&self, network: Network) -> Result<String, Error> {
        match self.payload {
            Payload::PubkeyHash(ref hash) => {
                Ok(encode_base58_address(network.p2pkh_version(), hash))
            }
            Payload::ScriptHash(ref hash) => {
                Ok(encode_base58_address(network.p2sh_version(), hash))
            }
            Payload::WitnessV0(ref program) => {
                encode_segwit_address(network.bech32_hrp(), 0, program)
            }
            Payload::None => match self.kind {
                ScriptKind::Tr => Err(Error::Unimplemented("taproot address")),
                _ => Ok(String::new()),
            },
        }
    }
}

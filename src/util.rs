// SPDX-License-Identifier: CC0-1.0

//! Hash and address encoding primitives.

use std::convert::TryFrom;

use bech32::{segwit, Fe32, Hrp};
use bitcoin::base58;
use bitcoin::hashes::{hash160, sha256, Hash};

use crate::Error;

/// Single SHA-256 of `data`
pub fn sha256(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).to_byte_array()
}

/// RIPEMD-160 of the SHA-256 of `data`
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Encodes a witness program as a segwit address (BIP-173 / BIP-350).
///
/// Version 0 programs use Bech32, versions 1 to 16 use Bech32m.
pub fn encode_segwit_address(
    hrp: &str,
    witness_version: u8,
    program: &[u8],
) -> Result<String, Error> {
    if witness_version > 16 {
        return Err(Error::Encoding(format!(
            "witness version {} out of range 0..=16",
            witness_version
        )));
    }
    if program.len() < 2 || program.len() > 40 {
        return Err(Error::Encoding(format!(
            "witness program of {} bytes, expected 2..=40",
            program.len()
        )));
    }
    let parsed_hrp = Hrp::parse(hrp)
        .map_err(|e| Error::Encoding(format!("invalid human-readable part «{}»: {}", hrp, e)))?;
    let version =
        Fe32::try_from(witness_version).map_err(|e| Error::Encoding(e.to_string()))?;

    segwit::encode(parsed_hrp, version, program).map_err(|e| Error::Encoding(e.to_string()))
}

/// Base58Check encoding of `version || hash`, the legacy P2PKH/P2SH format.
pub fn encode_base58_address(version: u8, hash: &[u8; 20]) -> String {
    let mut data = Vec::with_capacity(1 + hash.len());
    data.push(version);
    data.extend_from_slice(hash);
    base58::encode_check(&data)
}

//! Minimal Solidity ABI encoding for the registry and resolver calls
//!
//! Only what the bindings need: static 32-byte arguments on the way in;
//! `address`, `bytes32` and dynamic `bytes` on the way out.

use enslite_core::namehash::keccak256;
use enslite_core::{Address, Error, Result};

/// ABI word size in bytes
pub const WORD: usize = 32;

/// 4-byte function selector: first bytes of Keccak-256 of the signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a call with static word arguments
pub fn encode_call(signature: &str, args: &[[u8; WORD]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

/// Left-pad an unsigned integer into a word
pub fn word_u64(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_at(data: &[u8], index: usize) -> Result<&[u8]> {
    let start = index * WORD;
    data.get(start..start + WORD).ok_or_else(|| {
        Error::decode(format!(
            "return data too short: {} bytes, need word {}",
            data.len(),
            index
        ))
    })
}

fn word_as_usize(word: &[u8]) -> Result<usize> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(Error::decode("offset or length does not fit in 64 bits"));
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(be)).map_err(|_| Error::decode("offset or length overflows"))
}

/// Decode a single `address` return value
pub fn decode_address(data: &[u8]) -> Result<Address> {
    let word = word_at(data, 0)?;
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}

/// Decode a single `bytes32` return value
pub fn decode_bytes32(data: &[u8]) -> Result<[u8; 32]> {
    let mut out = [0u8; 32];
    out.copy_from_slice(word_at(data, 0)?);
    Ok(out)
}

/// Decode a single dynamic `bytes` return value
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let offset = word_as_usize(word_at(data, 0)?)?;
    if offset % WORD != 0 {
        return Err(Error::decode(format!("misaligned bytes offset {}", offset)));
    }

    let len = word_as_usize(word_at(data, offset / WORD)?)?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            Error::decode(format!(
                "bytes length {} exceeds return data ({} bytes)",
                len,
                data.len()
            ))
        })?;

    Ok(data[start..end].to_vec())
}

/// Encode a single dynamic `bytes` value as a function would return it
pub fn encode_bytes(value: &[u8]) -> Vec<u8> {
    let padded = value.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(2 * WORD + padded);
    out.extend_from_slice(&word_u64(WORD as u64));
    out.extend_from_slice(&word_u64(value.len() as u64));
    out.extend_from_slice(value);
    out.resize(2 * WORD + padded, 0);
    out
}

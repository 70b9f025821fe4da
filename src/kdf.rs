//! # Subkey Derivation
//!
//! Expands the master AES key into the per-layer subkeys. The generator is
//! AES in counter mode over a block that carries a domain-separating index
//! at byte 7 and a 1-based block counter at byte 15; everything else stays
//! zero. Each index yields an independent pseudorandom byte stream.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt};
use aes::Aes128;

use crate::constants::AES_BLOCK_SIZE;

/// Index deriving the pad-generator subkey
pub(crate) const KDF_INDEX_PDF: u8 = 0;
/// Index deriving the NH compression key
pub(crate) const KDF_INDEX_NH: u8 = 1;
/// Index deriving the POLY keys
pub(crate) const KDF_INDEX_POLY: u8 = 2;
/// Index deriving the inner-product keys
pub(crate) const KDF_INDEX_IP: u8 = 3;
/// Index deriving the inner-product output masks
pub(crate) const KDF_INDEX_IP_TRANS: u8 = 4;

/// Fill `out` with keying material for the given domain-separation index.
///
/// The final partial block, if any, is truncated to the bytes needed.
pub(crate) fn kdf(cipher: &Aes128, index: u8, out: &mut [u8]) {
    let mut block = [0u8; AES_BLOCK_SIZE];
    block[7] = index;

    for (i, chunk) in out.chunks_mut(AES_BLOCK_SIZE).enumerate() {
        block[15] = (i + 1) as u8;
        let mut ct = GenericArray::clone_from_slice(&block);
        cipher.encrypt_block(&mut ct);
        chunk.copy_from_slice(&ct[..chunk.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::KeyInit;

    fn cipher() -> Aes128 {
        Aes128::new(GenericArray::from_slice(b"abcdefghijklmnop"))
    }

    #[test]
    fn test_kdf_deterministic() {
        let mut a = [0u8; 48];
        let mut b = [0u8; 48];
        kdf(&cipher(), 1, &mut a);
        kdf(&cipher(), 1, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_kdf_indices_are_domain_separated() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        kdf(&cipher(), 1, &mut a);
        kdf(&cipher(), 2, &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kdf_short_output_is_a_prefix() {
        let mut long = [0u8; 48];
        let mut short = [0u8; 24];
        kdf(&cipher(), 3, &mut long);
        kdf(&cipher(), 3, &mut short);
        assert_eq!(long[..24], short[..]);
    }

    #[test]
    fn test_kdf_counter_advances_per_block() {
        let mut out = [0u8; 32];
        kdf(&cipher(), 0, &mut out);
        assert_ne!(out[..16], out[16..]);
    }
}

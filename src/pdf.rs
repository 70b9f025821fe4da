//! # Pad Generator
//!
//! Derives a one-time pad from the per-message nonce and XORs it onto the
//! finalizer output. The pad cipher is keyed by `AES_K(KDF(0))`, not the
//! master key. The last AES output is cached together with the nonce block
//! that produced it, so repeating a nonce, or flipping only the low bit for
//! 64-bit tags, skips the block encryption. The cache is purely an
//! optimization; a miss and a hit produce identical pads.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{AES_BLOCK_SIZE, UMAC128_TAG_SIZE, UMAC64_TAG_SIZE, UMAC_NONCE_SIZE};
use crate::kdf::{kdf, KDF_INDEX_PDF};

#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct PdfState {
    #[zeroize(skip)]
    cipher: Aes128,
    cache: [u8; AES_BLOCK_SIZE],
    nonce: [u8; AES_BLOCK_SIZE],
}

impl PdfState {
    pub(crate) fn new(master: &Aes128) -> Self {
        let mut subkey = [0u8; AES_BLOCK_SIZE];
        kdf(master, KDF_INDEX_PDF, &mut subkey);
        let cipher = Aes128::new(GenericArray::from_slice(&subkey));
        subkey.zeroize();

        // Prime the cache for the all-zero nonce block.
        let nonce = [0u8; AES_BLOCK_SIZE];
        let mut block = GenericArray::clone_from_slice(&nonce);
        cipher.encrypt_block(&mut block);
        let mut cache = [0u8; AES_BLOCK_SIZE];
        cache.copy_from_slice(&block);

        PdfState {
            cipher,
            cache,
            nonce,
        }
    }

    /// XOR the 8-byte pad for `nonce` into `tag`.
    ///
    /// The nonce's low bit is scrubbed before encryption and instead
    /// selects which half of the 16-byte AES output is emitted, so a
    /// consecutive nonce pair shares one block encryption.
    pub(crate) fn pad_xor_64(
        &mut self,
        nonce: &[u8; UMAC_NONCE_SIZE],
        tag: &mut [u8; UMAC64_TAG_SIZE],
    ) {
        const LOW_BIT: u8 = 0x01;
        let half = usize::from(nonce[7] & LOW_BIT) * 8;
        let scrubbed = [nonce[4], nonce[5], nonce[6], nonce[7] & !LOW_BIT];

        if self.nonce[4..8] != scrubbed[..] || self.nonce[..4] != nonce[..4] {
            self.nonce[..4].copy_from_slice(&nonce[..4]);
            self.nonce[4..8].copy_from_slice(&scrubbed);
            self.refill();
        }

        for (t, p) in tag.iter_mut().zip(&self.cache[half..half + 8]) {
            *t ^= p;
        }
    }

    /// XOR the 16-byte pad for `nonce` into `tag`.
    pub(crate) fn pad_xor_128(
        &mut self,
        nonce: &[u8; UMAC_NONCE_SIZE],
        tag: &mut [u8; UMAC128_TAG_SIZE],
    ) {
        if self.nonce[..8] != nonce[..] {
            self.nonce[..8].copy_from_slice(nonce);
            self.refill();
        }

        for (t, p) in tag.iter_mut().zip(&self.cache) {
            *t ^= p;
        }
    }

    fn refill(&mut self) {
        let mut block = GenericArray::clone_from_slice(&self.nonce);
        self.cipher.encrypt_block(&mut block);
        self.cache.copy_from_slice(&block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Aes128 {
        Aes128::new(GenericArray::from_slice(b"abcdefghijklmnop"))
    }

    #[test]
    fn test_low_bit_pair_shares_one_block() {
        // An even/odd nonce pair yields the two halves of the 128-bit pad
        // for the even nonce.
        let even = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let odd = [1u8, 2, 3, 4, 5, 6, 7, 9];

        let mut pdf = PdfState::new(&master());
        let mut lo = [0u8; UMAC64_TAG_SIZE];
        pdf.pad_xor_64(&even, &mut lo);
        let mut hi = [0u8; UMAC64_TAG_SIZE];
        pdf.pad_xor_64(&odd, &mut hi);

        let mut wide = [0u8; UMAC128_TAG_SIZE];
        let mut pdf128 = PdfState::new(&master());
        pdf128.pad_xor_128(&even, &mut wide);

        assert_eq!(wide[..8], lo);
        assert_eq!(wide[8..], hi);
    }

    #[test]
    fn test_cache_miss_equals_fresh_state() {
        let a = [9u8, 9, 9, 9, 9, 9, 9, 2];
        let b = [7u8, 7, 7, 7, 7, 7, 7, 4];

        let mut pdf = PdfState::new(&master());
        let mut first = [0u8; UMAC64_TAG_SIZE];
        pdf.pad_xor_64(&a, &mut first);
        let mut other = [0u8; UMAC64_TAG_SIZE];
        pdf.pad_xor_64(&b, &mut other);
        let mut again = [0u8; UMAC64_TAG_SIZE];
        pdf.pad_xor_64(&a, &mut again);

        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn test_pad_is_deterministic_across_instances() {
        let nonce = [0u8, 0, 0, 0, 0, 0, 0, 1];

        let mut one = PdfState::new(&master());
        let mut two = PdfState::new(&master());
        let mut pad_one = [0u8; UMAC128_TAG_SIZE];
        let mut pad_two = [0u8; UMAC128_TAG_SIZE];
        one.pad_xor_128(&nonce, &mut pad_one);
        two.pad_xor_128(&nonce, &mut pad_two);

        assert_eq!(pad_one, pad_two);
    }
}

//! # UMAC Controllers
//!
//! The public MAC handles, one per tag width. Each owns a pad generator and
//! a UHASH composite keyed from the same 16-byte master secret. `write`
//! streams message bytes, `sum` closes the message under a caller-supplied
//! 8-byte nonce.
//!
//! Unlike a typical streaming hash, `sum` takes the per-message nonce as
//! its argument; it is not an output-prefix buffer. Nonce freshness is the
//! caller's responsibility: a repeated (key, nonce) pair leaks the pad
//! difference of the two messages.

use aes::cipher::{generic_array::GenericArray, KeyInit};
use aes::Aes128;

use crate::constants::{UMAC128_TAG_SIZE, UMAC64_TAG_SIZE, UMAC_KEY_SIZE, UMAC_NONCE_SIZE};
use crate::error::{MacError, Result};
use crate::pdf::PdfState;
use crate::uhash::{UHash128, UHash64};
use crate::util::constant_time_compare;

/// UMAC with 64-bit tags.
pub struct Umac64 {
    pdf: PdfState,
    hash: UHash64,
}

impl Umac64 {
    /// Create an instance keyed by a 16-byte secret.
    pub fn new(key: &[u8; UMAC_KEY_SIZE]) -> Self {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        Umac64 {
            pdf: PdfState::new(&cipher),
            hash: UHash64::new(&cipher),
        }
    }

    /// Create an instance from a key slice, which must be 16 bytes.
    pub fn new_from_slice(key: &[u8]) -> Result<Self> {
        let key: &[u8; UMAC_KEY_SIZE] =
            key.try_into().map_err(|_| MacError::InvalidKeyLength {
                expected: UMAC_KEY_SIZE,
                got: key.len(),
            })?;
        Ok(Self::new(key))
    }

    /// Feed message bytes. The full input is always accepted; the return
    /// value is its length.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        self.hash.update(buf);
        buf.len()
    }

    /// Produce the tag for the bytes written so far.
    ///
    /// The argument is the per-message nonce, not an output-prefix buffer.
    /// Call [`reset`](Self::reset) before reusing the instance on a new
    /// message.
    pub fn sum(&mut self, nonce: &[u8; UMAC_NONCE_SIZE]) -> [u8; UMAC64_TAG_SIZE] {
        let mut tag = [0u8; UMAC64_TAG_SIZE];
        self.hash.finalize(&mut tag);
        self.pdf.pad_xor_64(nonce, &mut tag);
        tag
    }

    /// Like [`sum`](Self::sum), for a nonce slice, which must be 8 bytes.
    pub fn sum_from_slice(&mut self, nonce: &[u8]) -> Result<[u8; UMAC64_TAG_SIZE]> {
        let nonce: &[u8; UMAC_NONCE_SIZE] =
            nonce.try_into().map_err(|_| MacError::InvalidNonceLength {
                expected: UMAC_NONCE_SIZE,
                got: nonce.len(),
            })?;
        Ok(self.sum(nonce))
    }

    /// Compute the tag and compare against `expected` in constant time.
    pub fn verify(&mut self, nonce: &[u8; UMAC_NONCE_SIZE], expected: &[u8]) -> bool {
        let tag = self.sum(nonce);
        constant_time_compare(&tag, expected)
    }

    /// Clear message state; keys and the pad cache survive.
    pub fn reset(&mut self) {
        self.hash.reset();
    }

    /// Tag size in bytes.
    pub const fn size(&self) -> usize {
        UMAC64_TAG_SIZE
    }

    /// Input is accepted at any byte granularity.
    pub const fn block_size(&self) -> usize {
        1
    }
}

/// UMAC with 128-bit tags.
pub struct Umac128 {
    pdf: PdfState,
    hash: UHash128,
}

impl Umac128 {
    /// Create an instance keyed by a 16-byte secret.
    pub fn new(key: &[u8; UMAC_KEY_SIZE]) -> Self {
        let cipher = Aes128::new(GenericArray::from_slice(key));
        Umac128 {
            pdf: PdfState::new(&cipher),
            hash: UHash128::new(&cipher),
        }
    }

    /// Create an instance from a key slice, which must be 16 bytes.
    pub fn new_from_slice(key: &[u8]) -> Result<Self> {
        let key: &[u8; UMAC_KEY_SIZE] =
            key.try_into().map_err(|_| MacError::InvalidKeyLength {
                expected: UMAC_KEY_SIZE,
                got: key.len(),
            })?;
        Ok(Self::new(key))
    }

    /// Feed message bytes. The full input is always accepted; the return
    /// value is its length.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        self.hash.update(buf);
        buf.len()
    }

    /// Produce the tag for the bytes written so far.
    ///
    /// The argument is the per-message nonce, not an output-prefix buffer.
    /// Call [`reset`](Self::reset) before reusing the instance on a new
    /// message.
    pub fn sum(&mut self, nonce: &[u8; UMAC_NONCE_SIZE]) -> [u8; UMAC128_TAG_SIZE] {
        let mut tag = [0u8; UMAC128_TAG_SIZE];
        self.hash.finalize(&mut tag);
        self.pdf.pad_xor_128(nonce, &mut tag);
        tag
    }

    /// Like [`sum`](Self::sum), for a nonce slice, which must be 8 bytes.
    pub fn sum_from_slice(&mut self, nonce: &[u8]) -> Result<[u8; UMAC128_TAG_SIZE]> {
        let nonce: &[u8; UMAC_NONCE_SIZE] =
            nonce.try_into().map_err(|_| MacError::InvalidNonceLength {
                expected: UMAC_NONCE_SIZE,
                got: nonce.len(),
            })?;
        Ok(self.sum(nonce))
    }

    /// Compute the tag and compare against `expected` in constant time.
    pub fn verify(&mut self, nonce: &[u8; UMAC_NONCE_SIZE], expected: &[u8]) -> bool {
        let tag = self.sum(nonce);
        constant_time_compare(&tag, expected)
    }

    /// Clear message state; keys and the pad cache survive.
    pub fn reset(&mut self) {
        self.hash.reset();
    }

    /// Tag size in bytes.
    pub const fn size(&self) -> usize {
        UMAC128_TAG_SIZE
    }

    /// Input is accepted at any byte granularity.
    pub const fn block_size(&self) -> usize {
        1
    }
}

//! # NH Compressor
//!
//! The first hashing layer: a streaming universal hash that folds each
//! 1024-byte L1 chunk down to one 64-bit word per stream. The kernel works
//! on 32-byte blocks, viewed as eight little-endian 32-bit words, against a
//! Toeplitz-style key window that slides forward 8 words per block; adjacent
//! streams read the same key at a 16-byte offset.
//!
//! A 64-byte staging buffer lets `update` accept arbitrary input sizes while
//! compressing two blocks at a time. `finalize` zero-pads the tail to a
//! 32-byte boundary, folds the true bit length into every stream, and
//! resets for the next chunk.

use aes::Aes128;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    HASH_BUF_BYTES, L1_KEY_LEN, L1_KEY_SHIFT, L1_PAD_BOUNDARY, STREAMS_128, STREAMS_64,
};
use crate::kdf::{kdf, KDF_INDEX_NH};

const NH_KEY_BYTES_64: usize = L1_KEY_LEN + L1_KEY_SHIFT * (STREAMS_64 - 1);
const NH_KEY_WORDS_64: usize = NH_KEY_BYTES_64 / 4;
const NH_KEY_BYTES_128: usize = L1_KEY_LEN + L1_KEY_SHIFT * (STREAMS_128 - 1);
const NH_KEY_WORDS_128: usize = NH_KEY_BYTES_128 / 4;

/// Two-stream kernel. `data` must be a multiple of 32 bytes; `key` must
/// cover the window `[0, data.len() / 4 + 4)`.
#[inline]
fn nh_kernel_64(key: &[u32], data: &[u8], state: &mut [u64; STREAMS_64]) {
    debug_assert_eq!(data.len() % L1_PAD_BOUNDARY, 0);

    let mut k = 0;
    for block in data.chunks_exact(32) {
        let mut d = [0u32; 8];
        for (w, bytes) in d.iter_mut().zip(block.chunks_exact(4)) {
            *w = u32::from_le_bytes(bytes.try_into().unwrap());
        }

        state[0] = state[0]
            .wrapping_add(u64::from(key[k].wrapping_add(d[0])) * u64::from(key[k + 4].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 1].wrapping_add(d[1])) * u64::from(key[k + 5].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 2].wrapping_add(d[2])) * u64::from(key[k + 6].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 3].wrapping_add(d[3])) * u64::from(key[k + 7].wrapping_add(d[7])));

        state[1] = state[1]
            .wrapping_add(u64::from(key[k + 4].wrapping_add(d[0])) * u64::from(key[k + 8].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 5].wrapping_add(d[1])) * u64::from(key[k + 9].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 6].wrapping_add(d[2])) * u64::from(key[k + 10].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 7].wrapping_add(d[3])) * u64::from(key[k + 11].wrapping_add(d[7])));

        k += 8;
    }
}

/// Four-stream kernel, key window `[0, data.len() / 4 + 12)`.
#[inline]
fn nh_kernel_128(key: &[u32], data: &[u8], state: &mut [u64; STREAMS_128]) {
    debug_assert_eq!(data.len() % L1_PAD_BOUNDARY, 0);

    let mut k = 0;
    for block in data.chunks_exact(32) {
        let mut d = [0u32; 8];
        for (w, bytes) in d.iter_mut().zip(block.chunks_exact(4)) {
            *w = u32::from_le_bytes(bytes.try_into().unwrap());
        }

        state[0] = state[0]
            .wrapping_add(u64::from(key[k].wrapping_add(d[0])) * u64::from(key[k + 4].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 1].wrapping_add(d[1])) * u64::from(key[k + 5].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 2].wrapping_add(d[2])) * u64::from(key[k + 6].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 3].wrapping_add(d[3])) * u64::from(key[k + 7].wrapping_add(d[7])));

        state[1] = state[1]
            .wrapping_add(u64::from(key[k + 4].wrapping_add(d[0])) * u64::from(key[k + 8].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 5].wrapping_add(d[1])) * u64::from(key[k + 9].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 6].wrapping_add(d[2])) * u64::from(key[k + 10].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 7].wrapping_add(d[3])) * u64::from(key[k + 11].wrapping_add(d[7])));

        state[2] = state[2]
            .wrapping_add(u64::from(key[k + 8].wrapping_add(d[0])) * u64::from(key[k + 12].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 9].wrapping_add(d[1])) * u64::from(key[k + 13].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 10].wrapping_add(d[2])) * u64::from(key[k + 14].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 11].wrapping_add(d[3])) * u64::from(key[k + 15].wrapping_add(d[7])));

        state[3] = state[3]
            .wrapping_add(u64::from(key[k + 12].wrapping_add(d[0])) * u64::from(key[k + 16].wrapping_add(d[4])))
            .wrapping_add(u64::from(key[k + 13].wrapping_add(d[1])) * u64::from(key[k + 17].wrapping_add(d[5])))
            .wrapping_add(u64::from(key[k + 14].wrapping_add(d[2])) * u64::from(key[k + 18].wrapping_add(d[6])))
            .wrapping_add(u64::from(key[k + 15].wrapping_add(d[3])) * u64::from(key[k + 19].wrapping_add(d[7])));

        k += 8;
    }
}

/// NH state for the two-stream (64-bit tag) variant.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct NhState64 {
    key: [u32; NH_KEY_WORDS_64],
    data: [u8; HASH_BUF_BYTES],
    next_empty: usize,
    hashed: usize,
    state: [u64; STREAMS_64],
}

impl NhState64 {
    pub(crate) fn new(cipher: &Aes128) -> Self {
        let mut raw = [0u8; NH_KEY_BYTES_64];
        kdf(cipher, KDF_INDEX_NH, &mut raw);
        let mut key = [0u32; NH_KEY_WORDS_64];
        for (w, bytes) in key.iter_mut().zip(raw.chunks_exact(4)) {
            *w = u32::from_be_bytes(bytes.try_into().unwrap());
        }
        raw.zeroize();

        NhState64 {
            key,
            data: [0u8; HASH_BUF_BYTES],
            next_empty: 0,
            hashed: 0,
            state: [0u64; STREAMS_64],
        }
    }

    pub(crate) fn reset(&mut self) {
        self.next_empty = 0;
        self.hashed = 0;
        self.state = [0u64; STREAMS_64];
    }

    /// Run the kernel over `data` at the key offset reached so far.
    #[inline]
    fn compress(&mut self, data: &[u8]) {
        nh_kernel_64(&self.key[self.hashed / 4..], data, &mut self.state);
    }

    pub(crate) fn update(&mut self, mut buf: &[u8]) {
        let mut j = self.next_empty;
        if j + buf.len() >= HASH_BUF_BYTES {
            if j != 0 {
                let take = HASH_BUF_BYTES - j;
                self.data[j..].copy_from_slice(&buf[..take]);
                let staged = self.data;
                self.compress(&staged);
                self.hashed += HASH_BUF_BYTES;
                buf = &buf[take..];
            }
            let whole = buf.len() & !(HASH_BUF_BYTES - 1);
            if whole != 0 {
                self.compress(&buf[..whole]);
                self.hashed += whole;
                buf = &buf[whole..];
            }
            j = 0;
        }
        self.data[j..j + buf.len()].copy_from_slice(buf);
        self.next_empty = j + buf.len();
    }

    /// Flush the tail, fold in the bit length, and reset.
    pub(crate) fn finalize(&mut self, out: &mut [u64; STREAMS_64]) {
        if self.next_empty != 0 {
            let padded = (self.next_empty + (L1_PAD_BOUNDARY - 1)) & !(L1_PAD_BOUNDARY - 1);
            self.data[self.next_empty..padded].fill(0);
            let staged = self.data;
            self.compress(&staged[..padded]);
            self.hashed += self.next_empty;
        } else if self.hashed == 0 {
            // Genuinely empty stream: one all-zero block stands in.
            let zeros = [0u8; L1_PAD_BOUNDARY];
            self.compress(&zeros);
        }

        let nbits = (self.hashed as u64) << 3;
        out[0] = self.state[0].wrapping_add(nbits);
        out[1] = self.state[1].wrapping_add(nbits);
        self.reset();
    }

    /// One-shot variant for chunks already aligned on an L1 boundary.
    pub(crate) fn hash(
        &self,
        buf: &[u8],
        padded_len: usize,
        unpadded_len: usize,
        out: &mut [u64; STREAMS_64],
    ) {
        out.fill((unpadded_len as u64) << 3);
        nh_kernel_64(&self.key, &buf[..padded_len], out);
    }
}

/// NH state for the four-stream (128-bit tag) variant.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct NhState128 {
    key: [u32; NH_KEY_WORDS_128],
    data: [u8; HASH_BUF_BYTES],
    next_empty: usize,
    hashed: usize,
    state: [u64; STREAMS_128],
}

impl NhState128 {
    pub(crate) fn new(cipher: &Aes128) -> Self {
        let mut raw = [0u8; NH_KEY_BYTES_128];
        kdf(cipher, KDF_INDEX_NH, &mut raw);
        let mut key = [0u32; NH_KEY_WORDS_128];
        for (w, bytes) in key.iter_mut().zip(raw.chunks_exact(4)) {
            *w = u32::from_be_bytes(bytes.try_into().unwrap());
        }
        raw.zeroize();

        NhState128 {
            key,
            data: [0u8; HASH_BUF_BYTES],
            next_empty: 0,
            hashed: 0,
            state: [0u64; STREAMS_128],
        }
    }

    pub(crate) fn reset(&mut self) {
        self.next_empty = 0;
        self.hashed = 0;
        self.state = [0u64; STREAMS_128];
    }

    #[inline]
    fn compress(&mut self, data: &[u8]) {
        nh_kernel_128(&self.key[self.hashed / 4..], data, &mut self.state);
    }

    pub(crate) fn update(&mut self, mut buf: &[u8]) {
        let mut j = self.next_empty;
        if j + buf.len() >= HASH_BUF_BYTES {
            if j != 0 {
                let take = HASH_BUF_BYTES - j;
                self.data[j..].copy_from_slice(&buf[..take]);
                let staged = self.data;
                self.compress(&staged);
                self.hashed += HASH_BUF_BYTES;
                buf = &buf[take..];
            }
            let whole = buf.len() & !(HASH_BUF_BYTES - 1);
            if whole != 0 {
                self.compress(&buf[..whole]);
                self.hashed += whole;
                buf = &buf[whole..];
            }
            j = 0;
        }
        self.data[j..j + buf.len()].copy_from_slice(buf);
        self.next_empty = j + buf.len();
    }

    pub(crate) fn finalize(&mut self, out: &mut [u64; STREAMS_128]) {
        if self.next_empty != 0 {
            let padded = (self.next_empty + (L1_PAD_BOUNDARY - 1)) & !(L1_PAD_BOUNDARY - 1);
            self.data[self.next_empty..padded].fill(0);
            let staged = self.data;
            self.compress(&staged[..padded]);
            self.hashed += self.next_empty;
        } else if self.hashed == 0 {
            let zeros = [0u8; L1_PAD_BOUNDARY];
            self.compress(&zeros);
        }

        let nbits = (self.hashed as u64) << 3;
        for (o, s) in out.iter_mut().zip(self.state.iter()) {
            *o = s.wrapping_add(nbits);
        }
        self.reset();
    }

    pub(crate) fn hash(
        &self,
        buf: &[u8],
        padded_len: usize,
        unpadded_len: usize,
        out: &mut [u64; STREAMS_128],
    ) {
        out.fill((unpadded_len as u64) << 3);
        nh_kernel_128(&self.key, &buf[..padded_len], out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::generic_array::GenericArray;
    use aes::cipher::KeyInit;

    fn cipher() -> Aes128 {
        Aes128::new(GenericArray::from_slice(b"abcdefghijklmnop"))
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_streaming_matches_one_shot_on_full_chunk() {
        let cipher = cipher();
        let msg = pattern(L1_KEY_LEN);

        let mut nh = NhState64::new(&cipher);
        let mut streamed = [0u64; STREAMS_64];
        nh.update(&msg);
        nh.finalize(&mut streamed);

        let mut direct = [0u64; STREAMS_64];
        nh.hash(&msg, L1_KEY_LEN, L1_KEY_LEN, &mut direct);
        assert_eq!(streamed, direct);
    }

    #[test]
    fn test_streaming_matches_one_shot_four_streams() {
        let cipher = cipher();
        let msg = pattern(L1_KEY_LEN);

        let mut nh = NhState128::new(&cipher);
        let mut streamed = [0u64; STREAMS_128];
        nh.update(&msg);
        nh.finalize(&mut streamed);

        let mut direct = [0u64; STREAMS_128];
        nh.hash(&msg, L1_KEY_LEN, L1_KEY_LEN, &mut direct);
        assert_eq!(streamed, direct);
    }

    #[test]
    fn test_update_chunking_is_invariant() {
        let cipher = cipher();
        let msg = pattern(777);

        let mut whole = NhState64::new(&cipher);
        let mut expected = [0u64; STREAMS_64];
        whole.update(&msg);
        whole.finalize(&mut expected);

        for step in [1usize, 3, 31, 64, 65, 200] {
            let mut nh = NhState64::new(&cipher);
            let mut got = [0u64; STREAMS_64];
            for chunk in msg.chunks(step) {
                nh.update(chunk);
            }
            nh.finalize(&mut got);
            assert_eq!(got, expected, "chunk size {}", step);
        }
    }

    #[test]
    fn test_partial_tail_is_zero_padded() {
        let cipher = cipher();
        let msg = pattern(5);

        let mut nh = NhState64::new(&cipher);
        let mut streamed = [0u64; STREAMS_64];
        nh.update(&msg);
        nh.finalize(&mut streamed);

        let mut padded = [0u8; L1_PAD_BOUNDARY];
        padded[..5].copy_from_slice(&msg);
        let mut direct = [0u64; STREAMS_64];
        nh.hash(&padded, L1_PAD_BOUNDARY, 5, &mut direct);
        assert_eq!(streamed, direct);
    }

    #[test]
    fn test_empty_stream_compresses_one_zero_block() {
        let cipher = cipher();
        let mut nh = NhState64::new(&cipher);

        let mut empty = [0u64; STREAMS_64];
        nh.finalize(&mut empty);

        let mut zero_block = [0u64; STREAMS_64];
        nh.hash(&[0u8; L1_PAD_BOUNDARY], L1_PAD_BOUNDARY, 0, &mut zero_block);
        assert_eq!(empty, zero_block);
    }

    #[test]
    fn test_finalize_resets_state() {
        let cipher = cipher();
        let msg = pattern(300);

        let mut nh = NhState64::new(&cipher);
        let mut first = [0u64; STREAMS_64];
        nh.update(&msg);
        nh.finalize(&mut first);

        let mut second = [0u64; STREAMS_64];
        nh.update(&msg);
        nh.finalize(&mut second);
        assert_eq!(first, second);
    }
}

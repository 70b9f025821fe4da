//! # UHASH Composite
//!
//! The three-layer universal hash behind the tag. NH folds each 1024-byte
//! L1 chunk to one 64-bit word per stream; POLY accumulates those words with
//! a Horner step over GF(2^64 - 59); the inner-product layer reduces the
//! result mod 2^36 - 5 and masks it into a 32-bit slice per stream.
//! Messages of at most one L1 chunk skip POLY and feed the NH output to the
//! inner product directly.

use aes::Aes128;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    L1_KEY_LEN, STREAMS_128, STREAMS_64, UMAC128_TAG_SIZE, UMAC64_TAG_SIZE,
};
use crate::kdf::{kdf, KDF_INDEX_IP, KDF_INDEX_IP_TRANS, KDF_INDEX_POLY};
use crate::nh::{NhState128, NhState64};

/// POLY modulus, 2^64 - 59
pub(crate) const P64: u64 = 0xFFFF_FFFF_FFFF_FFC5;
/// Inner-product modulus, 2^36 - 5
pub(crate) const P36: u64 = 0x0000_000F_FFFF_FFFB;
/// Low 36 bits of a 64-bit word
const M36: u64 = 0x0000_000F_FFFF_FFFF;

/// Clears the top 7 bits of each 32-bit half of a POLY key. Keeps the
/// Horner accumulator below 2^65 - 118 so two conditional +59 fixups
/// complete the reduction.
const POLY_KEY_MASK: u64 = 0x01FF_FFFF_01FF_FFFF;

const L1_LEN: u32 = L1_KEY_LEN as u32;

/// One Horner step `cur * key + data (mod p64)`, on 32-bit limbs.
///
/// Requires a masked key. The high limb of the product is pre-reduced by
/// replacing `hi * 2^64` with `hi * 59`; the two carry fixups are part of
/// the reduction, not an optimization.
#[inline]
fn poly64(cur: u64, key: u64, data: u64) -> u64 {
    let key_hi = key >> 32;
    let key_lo = key & 0xFFFF_FFFF;
    let cur_hi = cur >> 32;
    let cur_lo = cur & 0xFFFF_FFFF;

    let x = key_hi * cur_lo + cur_hi * key_lo;
    let x_lo = x & 0xFFFF_FFFF;
    let x_hi = x >> 32;

    let mut res = (key_hi * cur_hi + x_hi) * 59 + key_lo * cur_lo;

    let t = x_lo << 32;
    res = res.wrapping_add(t);
    if res < t {
        res += 59;
    }
    res = res.wrapping_add(data);
    if res < data {
        res += 59;
    }
    res
}

/// Inner product of the four 16-bit limbs of `data`, most significant
/// first, against four keys already reduced below p36.
#[inline]
fn ip_aux(mut t: u64, keys: &[u64], data: u64) -> u64 {
    t += keys[0] * ((data >> 48) & 0xFFFF);
    t += keys[1] * ((data >> 32) & 0xFFFF);
    t += keys[2] * ((data >> 16) & 0xFFFF);
    t += keys[3] * (data & 0xFFFF);
    t
}

#[inline]
fn ip_reduce_p36(t: u64) -> u32 {
    let mut r = (t & M36) + 5 * (t >> 36);
    if r >= P36 {
        r -= P36;
    }
    r as u32
}

/// Two-stream composite for 8-byte tags.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct UHash64 {
    nh: NhState64,
    poly_key: [u64; STREAMS_64],
    poly_acc: [u64; STREAMS_64],
    ip_keys: [u64; 4 * STREAMS_64],
    ip_trans: [u32; STREAMS_64],
    msg_len: u32,
}

impl UHash64 {
    pub(crate) fn new(cipher: &Aes128) -> Self {
        let nh = NhState64::new(cipher);
        let mut buf = [0u8; (8 * STREAMS_64 + 4) * 8];

        kdf(cipher, KDF_INDEX_POLY, &mut buf);
        let mut poly_key = [0u64; STREAMS_64];
        for (i, k) in poly_key.iter_mut().enumerate() {
            let off = 24 * i;
            *k = u64::from_be_bytes(buf[off..off + 8].try_into().unwrap()) & POLY_KEY_MASK;
        }

        kdf(cipher, KDF_INDEX_IP, &mut buf);
        let mut ip_keys = [0u64; 4 * STREAMS_64];
        for i in 0..STREAMS_64 {
            let base = (8 * i + 4) * 8;
            for w in 0..4 {
                let off = base + 8 * w;
                ip_keys[4 * i + w] =
                    u64::from_be_bytes(buf[off..off + 8].try_into().unwrap()) % P36;
            }
        }

        kdf(cipher, KDF_INDEX_IP_TRANS, &mut buf[..STREAMS_64 * 4]);
        let mut ip_trans = [0u32; STREAMS_64];
        for (i, t) in ip_trans.iter_mut().enumerate() {
            *t = u32::from_be_bytes(buf[4 * i..4 * i + 4].try_into().unwrap());
        }

        buf.zeroize();

        UHash64 {
            nh,
            poly_key,
            poly_acc: [1u64; STREAMS_64],
            ip_keys,
            ip_trans,
            msg_len: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.nh.reset();
        self.msg_len = 0;
        self.poly_acc = [1u64; STREAMS_64];
    }

    /// Fold one set of NH outputs into the POLY accumulators. An input
    /// whose high half is all ones may reach p64; it is encoded as the
    /// pair (p64 - 1, input - 59) instead.
    fn poly_hash(&mut self, nh_out: &[u64; STREAMS_64]) {
        for i in 0..STREAMS_64 {
            if nh_out[i] >> 32 == 0xFFFF_FFFF {
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], P64 - 1);
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], nh_out[i] - 59);
            } else {
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], nh_out[i]);
            }
        }
    }

    fn ip_short(&self, nh_out: &[u64; STREAMS_64], out: &mut [u8; UMAC64_TAG_SIZE]) {
        for i in 0..STREAMS_64 {
            let t = ip_aux(0, &self.ip_keys[4 * i..4 * i + 4], nh_out[i]);
            let slice = ip_reduce_p36(t) ^ self.ip_trans[i];
            out[4 * i..4 * i + 4].copy_from_slice(&slice.to_be_bytes());
        }
    }

    fn ip_long(&mut self, out: &mut [u8; UMAC64_TAG_SIZE]) {
        for i in 0..STREAMS_64 {
            // Accumulators sit in [0, 2 * p64); one subtraction normalizes.
            if self.poly_acc[i] >= P64 {
                self.poly_acc[i] -= P64;
            }
            let t = ip_aux(0, &self.ip_keys[4 * i..4 * i + 4], self.poly_acc[i]);
            let slice = ip_reduce_p36(t) ^ self.ip_trans[i];
            out[4 * i..4 * i + 4].copy_from_slice(&slice.to_be_bytes());
        }
    }

    pub(crate) fn update(&mut self, mut buf: &[u8]) {
        let mut nh_out = [0u64; STREAMS_64];
        let buf_len = buf.len() as u32;

        if self.msg_len.wrapping_add(buf_len) <= L1_LEN {
            self.nh.update(buf);
            self.msg_len = self.msg_len.wrapping_add(buf_len);
        } else {
            let mut bytes_hashed = self.msg_len % L1_LEN;
            // Exactly one flushed chunk must read as a full chunk, not zero.
            if self.msg_len == L1_LEN {
                bytes_hashed = L1_LEN;
            }

            if bytes_hashed.wrapping_add(buf_len) >= L1_LEN {
                if bytes_hashed != 0 {
                    let remaining = (L1_LEN - bytes_hashed) as usize;
                    self.nh.update(&buf[..remaining]);
                    self.nh.finalize(&mut nh_out);
                    self.msg_len = self.msg_len.wrapping_add(remaining as u32);
                    self.poly_hash(&nh_out);
                    buf = &buf[remaining..];
                }

                while buf.len() >= L1_KEY_LEN {
                    self.nh.hash(&buf[..L1_KEY_LEN], L1_KEY_LEN, L1_KEY_LEN, &mut nh_out);
                    self.msg_len = self.msg_len.wrapping_add(L1_LEN);
                    buf = &buf[L1_KEY_LEN..];
                    self.poly_hash(&nh_out);
                }
            }

            if !buf.is_empty() {
                self.nh.update(buf);
                self.msg_len = self.msg_len.wrapping_add(buf.len() as u32);
            }
        }
    }

    pub(crate) fn finalize(&mut self, out: &mut [u8; UMAC64_TAG_SIZE]) {
        let mut nh_out = [0u64; STREAMS_64];
        if self.msg_len > L1_LEN {
            if self.msg_len % L1_LEN != 0 {
                self.nh.finalize(&mut nh_out);
                self.poly_hash(&nh_out);
            }
            self.ip_long(out);
        } else {
            self.nh.finalize(&mut nh_out);
            self.ip_short(&nh_out, out);
        }
        self.reset();
    }
}

/// Four-stream composite for 16-byte tags.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct UHash128 {
    nh: NhState128,
    poly_key: [u64; STREAMS_128],
    poly_acc: [u64; STREAMS_128],
    ip_keys: [u64; 4 * STREAMS_128],
    ip_trans: [u32; STREAMS_128],
    msg_len: u32,
}

impl UHash128 {
    pub(crate) fn new(cipher: &Aes128) -> Self {
        let nh = NhState128::new(cipher);
        let mut buf = [0u8; (8 * STREAMS_128 + 4) * 8];

        kdf(cipher, KDF_INDEX_POLY, &mut buf);
        let mut poly_key = [0u64; STREAMS_128];
        for (i, k) in poly_key.iter_mut().enumerate() {
            let off = 24 * i;
            *k = u64::from_be_bytes(buf[off..off + 8].try_into().unwrap()) & POLY_KEY_MASK;
        }

        kdf(cipher, KDF_INDEX_IP, &mut buf);
        let mut ip_keys = [0u64; 4 * STREAMS_128];
        for i in 0..STREAMS_128 {
            let base = (8 * i + 4) * 8;
            for w in 0..4 {
                let off = base + 8 * w;
                ip_keys[4 * i + w] =
                    u64::from_be_bytes(buf[off..off + 8].try_into().unwrap()) % P36;
            }
        }

        kdf(cipher, KDF_INDEX_IP_TRANS, &mut buf[..STREAMS_128 * 4]);
        let mut ip_trans = [0u32; STREAMS_128];
        for (i, t) in ip_trans.iter_mut().enumerate() {
            *t = u32::from_be_bytes(buf[4 * i..4 * i + 4].try_into().unwrap());
        }

        buf.zeroize();

        UHash128 {
            nh,
            poly_key,
            poly_acc: [1u64; STREAMS_128],
            ip_keys,
            ip_trans,
            msg_len: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.nh.reset();
        self.msg_len = 0;
        self.poly_acc = [1u64; STREAMS_128];
    }

    fn poly_hash(&mut self, nh_out: &[u64; STREAMS_128]) {
        for i in 0..STREAMS_128 {
            if nh_out[i] >> 32 == 0xFFFF_FFFF {
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], P64 - 1);
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], nh_out[i] - 59);
            } else {
                self.poly_acc[i] = poly64(self.poly_acc[i], self.poly_key[i], nh_out[i]);
            }
        }
    }

    fn ip_short(&self, nh_out: &[u64; STREAMS_128], out: &mut [u8; UMAC128_TAG_SIZE]) {
        for i in 0..STREAMS_128 {
            let t = ip_aux(0, &self.ip_keys[4 * i..4 * i + 4], nh_out[i]);
            let slice = ip_reduce_p36(t) ^ self.ip_trans[i];
            out[4 * i..4 * i + 4].copy_from_slice(&slice.to_be_bytes());
        }
    }

    fn ip_long(&mut self, out: &mut [u8; UMAC128_TAG_SIZE]) {
        for i in 0..STREAMS_128 {
            if self.poly_acc[i] >= P64 {
                self.poly_acc[i] -= P64;
            }
            let t = ip_aux(0, &self.ip_keys[4 * i..4 * i + 4], self.poly_acc[i]);
            let slice = ip_reduce_p36(t) ^ self.ip_trans[i];
            out[4 * i..4 * i + 4].copy_from_slice(&slice.to_be_bytes());
        }
    }

    pub(crate) fn update(&mut self, mut buf: &[u8]) {
        let mut nh_out = [0u64; STREAMS_128];
        let buf_len = buf.len() as u32;

        if self.msg_len.wrapping_add(buf_len) <= L1_LEN {
            self.nh.update(buf);
            self.msg_len = self.msg_len.wrapping_add(buf_len);
        } else {
            let mut bytes_hashed = self.msg_len % L1_LEN;
            if self.msg_len == L1_LEN {
                bytes_hashed = L1_LEN;
            }

            if bytes_hashed.wrapping_add(buf_len) >= L1_LEN {
                if bytes_hashed != 0 {
                    let remaining = (L1_LEN - bytes_hashed) as usize;
                    self.nh.update(&buf[..remaining]);
                    self.nh.finalize(&mut nh_out);
                    self.msg_len = self.msg_len.wrapping_add(remaining as u32);
                    self.poly_hash(&nh_out);
                    buf = &buf[remaining..];
                }

                while buf.len() >= L1_KEY_LEN {
                    self.nh.hash(&buf[..L1_KEY_LEN], L1_KEY_LEN, L1_KEY_LEN, &mut nh_out);
                    self.msg_len = self.msg_len.wrapping_add(L1_LEN);
                    buf = &buf[L1_KEY_LEN..];
                    self.poly_hash(&nh_out);
                }
            }

            if !buf.is_empty() {
                self.nh.update(buf);
                self.msg_len = self.msg_len.wrapping_add(buf.len() as u32);
            }
        }
    }

    pub(crate) fn finalize(&mut self, out: &mut [u8; UMAC128_TAG_SIZE]) {
        let mut nh_out = [0u64; STREAMS_128];
        if self.msg_len > L1_LEN {
            if self.msg_len % L1_LEN != 0 {
                self.nh.finalize(&mut nh_out);
                self.poly_hash(&nh_out);
            }
            self.ip_long(out);
        } else {
            self.nh.finalize(&mut nh_out);
            self.ip_short(&nh_out, out);
        }
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly_model(cur: u64, key: u64, data: u64) -> u64 {
        (((cur as u128) * (key as u128) + data as u128) % (P64 as u128)) as u64
    }

    #[test]
    fn test_poly64_matches_wide_model() {
        let key = 0x01AB_CDEF_0123_4567u64 & POLY_KEY_MASK;
        let mut cur = 1u64;
        for data in [
            0u64,
            59,
            P64 - 1,
            0x0123_4567_89AB_CDEF,
            u64::MAX - 123,
            0xFFFF_FFFE_0000_0001,
        ] {
            let next = poly64(cur, key, data);
            assert_eq!(next % P64, poly_model(cur, key, data), "data {:#x}", data);
            cur = next;
        }
    }

    #[test]
    fn test_poly64_chain_stays_congruent() {
        let key = 0x0001_F00D_0000_BEEFu64 & POLY_KEY_MASK;
        let mut fast = 1u64;
        let mut model = 1u64;
        for i in 0..500u64 {
            let data = i.wrapping_mul(0x9E37_79B9_7F4A_7C15);
            fast = poly64(fast, key, data);
            model = poly_model(model, key, data);
            assert_eq!(fast % P64, model);
        }
    }

    #[test]
    fn test_ip_reduce_p36_matches_wide_model() {
        for t in [0u64, 4, 5, P36 - 1, P36, P36 + 1, M36, M36 + 1, u64::MAX] {
            let want = ((t as u128) % (P36 as u128)) as u64 as u32;
            assert_eq!(ip_reduce_p36(t), want, "t {:#x}", t);
        }
    }

    #[test]
    fn test_ip_aux_small_case() {
        // keys (1, 2, 3, 4) against limbs (a, b, c, d) is a dot product
        let keys = [1u64, 2, 3, 4];
        let data = 0x0001_0002_0003_0004u64;
        assert_eq!(ip_aux(0, &keys, data), 1 + 4 + 9 + 16);
    }
}

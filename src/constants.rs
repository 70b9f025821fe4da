//! # Constants
//!
//! Shared sizing constants for the UMAC construction.

/// UMAC master key size in bytes (an AES-128 key)
pub const UMAC_KEY_SIZE: usize = 16;

/// Per-message nonce size in bytes
pub const UMAC_NONCE_SIZE: usize = 8;

/// UMAC-64 authentication tag size in bytes
pub const UMAC64_TAG_SIZE: usize = 8;

/// UMAC-128 authentication tag size in bytes
pub const UMAC128_TAG_SIZE: usize = 16;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Hash lanes behind the 64-bit tag
pub const STREAMS_64: usize = 2;

/// Hash lanes behind the 128-bit tag
pub const STREAMS_128: usize = 4;

/// NH key bytes consumed per L1 chunk
pub const L1_KEY_LEN: usize = 1024;

/// Toeplitz key shift between adjacent streams, in bytes
pub const L1_KEY_SHIFT: usize = 16;

/// NH pads the final partial block of a chunk to this boundary
pub const L1_PAD_BOUNDARY: usize = 32;

/// NH staging buffer size, two 32-byte blocks
pub const HASH_BUF_BYTES: usize = 64;

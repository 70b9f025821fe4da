//! # umac - Fast Message Authentication
//!
//! UMAC-64 and UMAC-128 (RFC 4418) built on AES-128, with:
//! - Streaming input at any byte granularity
//! - Bit-exact tags against the RFC test vectors
//! - No heap allocation after construction
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── kdf.rs        # AES counter-mode subkey derivation
//! ├── nh.rs         # NH compressor (layer 1)
//! ├── uhash.rs      # POLY + inner-product finalizer (layers 2 and 3)
//! ├── pdf.rs        # Nonce-keyed pad generator
//! ├── umac.rs       # Public Umac64 / Umac128 handles
//! ├── constants.rs  # Shared sizes
//! ├── error.rs      # Configuration errors
//! └── util.rs       # Constant-time comparison
//! ```
//!
//! ## Usage
//!
//! ```
//! use umac::Umac64;
//!
//! let mut mac = Umac64::new(b"sixteen byte key");
//! mac.write(b"bob, authenticate this message");
//! let tag = mac.sum(b"nonce-01");
//! # assert_eq!(tag.len(), 8);
//! ```
//!
//! Every message needs a fresh 8-byte nonce; call `reset` before reusing an
//! instance. Tag production diverges from the usual streaming-hash shape:
//! `sum` takes the nonce, it does not append to an output prefix.

pub mod constants;
mod error;
mod kdf;
mod nh;
mod pdf;
mod uhash;
mod umac;
mod util;

// Re-export commonly used types
pub use constants::{UMAC128_TAG_SIZE, UMAC64_TAG_SIZE, UMAC_KEY_SIZE, UMAC_NONCE_SIZE};
pub use error::{MacError, Result};
pub use umac::{Umac128, Umac64};
pub use util::constant_time_compare;

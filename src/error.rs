//! # Error Module
//!
//! Configuration errors surfaced by the slice-taking entry points. The
//! typed constructors make these unrepresentable; the errors exist for
//! callers handing in runtime-sized key or nonce material.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacError {
    InvalidKeyLength { expected: usize, got: usize },
    InvalidNonceLength { expected: usize, got: usize },
}

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacError::InvalidKeyLength { expected, got } => {
                write!(f, "invalid key length: expected {}, got {}", expected, got)
            }
            MacError::InvalidNonceLength { expected, got } => {
                write!(f, "invalid nonce length: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for MacError {}

pub type Result<T> = std::result::Result<T, MacError>;

//! Content hashing for dedup addresses.
//!
//! # Overview
//!
//! [`Hasher`] turns a byte payload into a lowercase hex digest that is used as
//! a hash-space content address. The algorithm is selected with
//! [`HashAlgorithm`]; MD5 (128-bit) is the default.
//!
//! A `Hasher` holds mutable digest state and is therefore owned by exactly one
//! thread at a time: each pipeline worker and each walker (for caller-runs
//! execution) constructs its own instance. The state is reset after every
//! digest so the same instance serves any number of tasks.
//!
//! # Example
//!
//! ```
//! use dupescan::scanner::{HashAlgorithm, Hasher};
//!
//! let mut hasher = Hasher::new(HashAlgorithm::Md5);
//! assert_eq!(hasher.digest_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
//!
//! let algorithm: HashAlgorithm = "sha256".parse().unwrap();
//! assert_eq!(Hasher::new(algorithm).digest_hex(b"abc").len(), 64);
//! ```

use std::fmt::{self, Write as _};
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// Digest algorithms available for content addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5, 128-bit. Fast and sufficient for accidental-duplicate detection.
    #[default]
    Md5,
    /// SHA-256, 256-bit.
    Sha256,
    /// BLAKE3, 256-bit.
    Blake3,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashAlgorithm; 3] = [Self::Md5, Self::Sha256, Self::Blake3];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Digest width in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(HashError::DigestUnavailable(s.to_string())),
        }
    }
}

enum DigestState {
    Md5(Md5),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

/// Single-owner digest engine.
pub struct Hasher {
    algorithm: HashAlgorithm,
    state: DigestState,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Md5 => DigestState::Md5(Md5::new()),
            HashAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => DigestState::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self { algorithm, state }
    }

    /// The algorithm this hasher computes.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest the full payload and return raw digest bytes.
    ///
    /// The internal state is reset afterwards.
    pub fn digest(&mut self, bytes: &[u8]) -> Vec<u8> {
        match &mut self.state {
            DigestState::Md5(h) => {
                Digest::update(h, bytes);
                h.finalize_reset().to_vec()
            }
            DigestState::Sha256(h) => {
                Digest::update(h, bytes);
                h.finalize_reset().to_vec()
            }
            DigestState::Blake3(h) => {
                h.update(bytes);
                let out = h.finalize();
                h.reset();
                out.as_bytes().to_vec()
            }
        }
    }

    /// Digest the payload and render it as lowercase hex.
    pub fn digest_hex(&mut self, bytes: &[u8]) -> String {
        hash_to_hex(&self.digest(bytes))
    }
}

/// Render digest bytes as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing into a String cannot fail.
        let _ = write!(out, "{b:02x}");
    }
    out
}

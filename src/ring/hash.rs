//! Placement and request hash functions.
//!
//! Both functions map small integers (or arbitrary request keys) onto `[0, slots)`.
//! The ring only relies on determinism; the distribution quality is what differs
//! between strategies.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Identifier a client request is routed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Int(u64),
    Str(String),
}

impl RequestKey {
    /// Numeric keys stay numeric so the polynomial hash sees the raw value.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(value) => RequestKey::Int(value),
            Err(_) => RequestKey::Str(raw.to_string()),
        }
    }
}

impl From<u64> for RequestKey {
    fn from(value: u64) -> Self {
        RequestKey::Int(value)
    }
}

impl From<&str> for RequestKey {
    fn from(value: &str) -> Self {
        RequestKey::Str(value.to_string())
    }
}

impl From<String> for RequestKey {
    fn from(value: String) -> Self {
        RequestKey::Str(value)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKey::Int(value) => write!(f, "{}", value),
            RequestKey::Str(value) => f.write_str(value),
        }
    }
}

/// Pluggable pair of hash functions used by a `Ring`.
///
/// A ring keeps its strategy for its whole lifetime: placement at build time and
/// lookup afterwards must agree, otherwise requests land on the wrong slots.
pub trait HashStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Slot of replica `replica` of the node at position `ordinal`.
    fn placement(&self, ordinal: usize, replica: usize, slots: usize) -> usize;

    /// Slot a request key hashes to.
    fn request(&self, key: &RequestKey, slots: usize) -> usize;
}

/// Low-cost polynomial hashes: `(i² + 4j) mod S` and `(3k³ + 5) mod S`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Polynomial;

impl HashStrategy for Polynomial {
    fn name(&self) -> &'static str {
        "polynomial"
    }

    fn placement(&self, ordinal: usize, replica: usize, slots: usize) -> usize {
        let s = slots as u128;
        let i = ordinal as u128 % s;
        let j = replica as u128 % s;

        ((i * i + 4 * j) % s) as usize
    }

    fn request(&self, key: &RequestKey, slots: usize) -> usize {
        let s = slots as u128;
        let k = match key {
            RequestKey::Int(value) => *value as u128 % s,
            RequestKey::Str(text) => text
                .bytes()
                .fold(0u128, |acc, byte| (acc * 31 + byte as u128) % s),
        };

        // Reduced before every multiplication so large keys cannot overflow.
        let cube = (k * k % s) * k % s;
        ((3 * cube + 5) % s) as usize
    }
}

/// SHA-256 based hashes, reduced modulo the ring capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl Sha256Digest {
    fn digest_slot(bytes: &[u8], slots: usize) -> usize {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);

        (u64::from_be_bytes(head) % slots as u64) as usize
    }
}

impl HashStrategy for Sha256Digest {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn placement(&self, ordinal: usize, replica: usize, slots: usize) -> usize {
        Self::digest_slot(format!("{}-{}", ordinal, replica).as_bytes(), slots)
    }

    fn request(&self, key: &RequestKey, slots: usize) -> usize {
        Self::digest_slot(key.to_string().as_bytes(), slots)
    }
}

/// Configuration-level selector for a `HashStrategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HashKind {
    #[default]
    Polynomial,
    #[value(name = "sha256")]
    Sha256,
}

impl HashKind {
    pub fn strategy(self) -> Arc<dyn HashStrategy> {
        match self {
            HashKind::Polynomial => Arc::new(Polynomial),
            HashKind::Sha256 => Arc::new(Sha256Digest),
        }
    }
}

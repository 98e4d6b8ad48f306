//! Consistent Hash Ring Module
//!
//! A fixed-capacity circular array of slots. Every backend node owns `K` virtual
//! nodes on the ring; a request is hashed to a slot and served by the first
//! occupied slot found along the probe sequence.
//!
//! ## Core Concepts
//! - **Hash strategies**: `hash` holds the placement and request hash functions
//!   (a cheap polynomial variant and a SHA-256 digest variant).
//! - **Probing**: `probe` resolves slot collisions, linearly or quadratically.
//! - **Rebuilds**: a `Ring` is immutable. Membership changes build a brand new
//!   ring from scratch, so ordinals (and virtual node placements) are recomputed.

pub mod hash;
pub mod probe;
pub mod ring;
pub mod types;

pub use hash::{HashKind, HashStrategy, Polynomial, RequestKey, Sha256Digest};
pub use probe::ProbePolicy;
pub use ring::Ring;
pub use types::{DEFAULT_SLOTS, DEFAULT_VNODES, LookupMiss, RingConfig, RingError};

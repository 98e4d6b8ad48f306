use thiserror::Error;

use super::hash::HashKind;
use super::probe::ProbePolicy;

/// Ring capacity used by the balancer unless configured otherwise.
pub const DEFAULT_SLOTS: usize = 512;
/// Virtual nodes per physical node.
pub const DEFAULT_VNODES: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),

    /// No free slot left for a virtual node; the whole build is discarded.
    #[error("hash ring is full: no free slot for replica {replica} of {node} ({slots} slots)")]
    CapacityExhausted {
        node: String,
        replica: usize,
        slots: usize,
    },
}

/// Why a lookup found no node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// The ring has no members at all.
    EmptyRing,
    /// Members exist but the probe sequence never reached one of their slots.
    Exhausted,
}

/// Parameters fixed for the lifetime of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    pub slots: usize,
    pub vnodes: usize,
    pub hash: HashKind,
    pub probe: ProbePolicy,
}

impl RingConfig {
    pub fn validate(&self) -> Result<(), RingError> {
        if self.slots == 0 {
            return Err(RingError::InvalidConfig(
                "ring must have at least one slot".to_string(),
            ));
        }
        if self.vnodes == 0 {
            return Err(RingError::InvalidConfig(
                "nodes need at least one virtual node".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            vnodes: DEFAULT_VNODES,
            hash: HashKind::default(),
            probe: ProbePolicy::default(),
        }
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ring::{Ring, RingError};

/// A backend node known to the balancer.
///
/// `addr` (`host:port`) is what the ring places and what requests are sent to;
/// `name` is the hostname a client may use to refer to the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub addr: String,
}

impl Member {
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
        }
    }

    /// Clients may refer to a node either by hostname or by address.
    pub fn matches(&self, ident: &str) -> bool {
        self.name == ident || self.addr == ident
    }
}

/// Membership list together with the ring built from it.
///
/// Both halves are replaced together, so a reader holding a view never sees a
/// ring that disagrees with the member list.
#[derive(Debug)]
pub struct ClusterView {
    pub members: Vec<Member>,
    pub ring: Ring,
}

impl ClusterView {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn addresses(&self) -> Vec<String> {
        addresses(&self.members)
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.members.iter().any(|member| member.addr == addr)
    }
}

pub fn addresses(members: &[Member]) -> Vec<String> {
    members.iter().map(|member| member.addr.clone()).collect()
}

/// A node that was requested but never made it into the membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionFailure {
    pub name: Option<String>,
    pub addr: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub members: Vec<Member>,
    pub added: Vec<Member>,
    pub failed: Vec<ProvisionFailure>,
}

#[derive(Debug, Clone)]
pub struct RemoveOutcome {
    pub members: Vec<Member>,
    pub removed: Vec<Member>,
}

#[derive(Debug, Error)]
pub enum MembershipError {
    /// Malformed add/remove request, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// The new membership does not fit on the ring; previous state is kept.
    #[error(transparent)]
    Ring(#[from] RingError),
}

//! Balancer HTTP Protocol
//!
//! Endpoints and JSON envelopes of the public balancer API. Every response is
//! wrapped as `{"message": ..., "status": "successful" | "failure"}`; on
//! failure `message` is a single `Error: ...` string.

use serde::{Deserialize, Serialize};

use crate::membership::types::{Member, ProvisionFailure};

// --- API Endpoints ---

/// Current membership.
pub const ENDPOINT_REP: &str = "/rep";
/// Scale up by `n` nodes.
pub const ENDPOINT_ADD: &str = "/add";
/// Scale down by `n` nodes.
pub const ENDPOINT_RM: &str = "/rm";

pub const STATUS_SUCCESSFUL: &str = "successful";
pub const STATUS_FAILURE: &str = "failure";

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: T,
    pub status: String,
}

impl<T> Envelope<T> {
    pub fn successful(message: T) -> Self {
        Self {
            message,
            status: STATUS_SUCCESSFUL.to_string(),
        }
    }
}

impl Envelope<String> {
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Error: {}", error),
            status: STATUS_FAILURE.to_string(),
        }
    }
}

/// Body of `/add` and `/rm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleRequest {
    pub n: i64,
    /// Preferred hostnames, applied before any generated or random choice.
    #[serde(default)]
    pub hostnames: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaSet {
    #[serde(rename = "N")]
    pub n: usize,
    /// Node addresses in membership order.
    pub replicas: Vec<String>,
    pub status: String,
}

impl ReplicaSet {
    pub fn of(members: &[Member]) -> Self {
        Self {
            n: members.len(),
            replicas: members.iter().map(|member| member.addr.clone()).collect(),
            status: STATUS_SUCCESSFUL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReport {
    #[serde(flatten)]
    pub replicas: ReplicaSet,
    pub added: Vec<Member>,
    /// Requested nodes that never became ready.
    pub failed: Vec<ProvisionFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveReport {
    #[serde(flatten)]
    pub replicas: ReplicaSet,
    pub removed: Vec<Member>,
}

/// Query of `/home`. Without `key` a random request id is drawn.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeQuery {
    pub key: Option<String>,
}

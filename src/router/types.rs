use std::time::Duration;

use crate::ring::LookupMiss;

/// A backend reply, passed back to the client unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// What a single routing attempt ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Dispatched {
        addr: String,
        response: BackendResponse,
    },
    /// The health check failed; nothing was sent.
    NodeDead(String),
    /// The node passed its health check but the request itself could not be delivered.
    Transient(String),
    NoNode(LookupMiss),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    pub dispatch_timeout: Duration,
    /// Pause after a transient failure before control returns to the caller.
    pub transient_delay: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(3),
            transient_delay: Duration::from_millis(500),
        }
    }
}

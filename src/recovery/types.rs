use thiserror::Error;

use crate::router::types::BackendResponse;

/// A request that reached a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub addr: String,
    /// Routing attempts used, including the successful one.
    pub attempts: usize,
    pub response: BackendResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("No healthy server found after {attempts} attempts")]
    NoHealthyNode { attempts: usize },
}

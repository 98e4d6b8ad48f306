//! Node Provisioning Module
//!
//! The balancer never starts or stops backends itself. It goes through the
//! `NodeProvisioner` capability, which creates a node, destroys it, and reports
//! whether it is ready to serve (the same check doubles as the liveness probe).
//!
//! ## Implementations
//! - **`process`**: spawns the `backend` binary as a local child process.
//! - **`external`**: nodes live in an external orchestrator and are addressed by name.

pub mod external;
pub mod heartbeat;
pub mod process;
pub mod readiness;

use async_trait::async_trait;

use crate::membership::types::Member;

pub use external::ExternalProvisioner;
pub use heartbeat::HeartbeatProbe;
pub use process::ProcessProvisioner;
pub use readiness::{ReadinessPolicy, wait_until_ready};

#[async_trait]
pub trait NodeProvisioner: Send + Sync {
    /// Creates a node, named `name` if given, and returns where it can be reached.
    async fn provision(&self, name: Option<&str>) -> anyhow::Result<Member>;

    /// Destroys the node at `addr`. Unknown addresses are not an error.
    async fn teardown(&self, addr: &str) -> anyhow::Result<()>;

    /// Single health check, bounded by the implementation's own timeout.
    async fn is_ready(&self, addr: &str) -> bool;
}

/// Random `server<NNNN>` name for nodes requested without a hostname.
pub fn generate_name() -> String {
    use rand::Rng;
    format!("server{}", rand::thread_rng().gen_range(1000..=9999))
}

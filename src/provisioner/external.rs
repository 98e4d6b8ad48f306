use anyhow::Result;
use async_trait::async_trait;

use super::heartbeat::HeartbeatProbe;
use super::{NodeProvisioner, generate_name};
use crate::membership::types::Member;

/// Nodes owned by an outside orchestrator (containers reachable by hostname).
///
/// Provisioning only derives the `name:port` address; the orchestrator is
/// expected to bring the node up, and readiness polling tells us whether it did.
pub struct ExternalProvisioner {
    port: u16,
    probe: HeartbeatProbe,
}

impl ExternalProvisioner {
    pub fn new(port: u16, probe: HeartbeatProbe) -> Self {
        Self { port, probe }
    }

    pub fn member(&self, name: &str) -> Member {
        Member::new(name, format!("{}:{}", name, self.port))
    }
}

#[async_trait]
impl NodeProvisioner for ExternalProvisioner {
    async fn provision(&self, name: Option<&str>) -> Result<Member> {
        let member = match name {
            Some(name) => self.member(name),
            None => self.member(&generate_name()),
        };

        tracing::info!("Expecting server {} at {}", member.name, member.addr);
        Ok(member)
    }

    async fn teardown(&self, addr: &str) -> Result<()> {
        tracing::info!("Released server at {}", addr);
        Ok(())
    }

    async fn is_ready(&self, addr: &str) -> bool {
        self.probe.check(addr).await
    }
}

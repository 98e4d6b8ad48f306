//! Local process provisioner.
//!
//! Every node is a `backend` child process bound to a free localhost port.
//! Children are killed on teardown, and on drop of the provisioner.

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

use super::heartbeat::HeartbeatProbe;
use super::{NodeProvisioner, generate_name};
use crate::membership::types::Member;

const NAME_ATTEMPTS: usize = 100;

struct RunningNode {
    name: String,
    child: Child,
}

pub struct ProcessProvisioner {
    binary: PathBuf,
    host: String,
    children: DashMap<String, RunningNode>,
    probe: HeartbeatProbe,
}

impl ProcessProvisioner {
    pub fn new(binary: PathBuf, probe: HeartbeatProbe) -> Self {
        Self {
            binary,
            host: "127.0.0.1".to_string(),
            children: DashMap::new(),
            probe,
        }
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }

    fn find_by_name(&self, name: &str) -> Option<String> {
        self.children
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| entry.key().clone())
    }

    fn unique_name(&self) -> Result<String> {
        for _ in 0..NAME_ATTEMPTS {
            let candidate = generate_name();
            if self.find_by_name(&candidate).is_none() {
                return Ok(candidate);
            }
        }

        Err(anyhow::anyhow!("Failed to generate a unique server name"))
    }

    fn free_port(&self) -> Result<u16> {
        let listener = std::net::TcpListener::bind((self.host.as_str(), 0))?;
        Ok(listener.local_addr()?.port())
    }
}

#[async_trait]
impl NodeProvisioner for ProcessProvisioner {
    async fn provision(&self, name: Option<&str>) -> Result<Member> {
        let name = match name {
            Some(name) => {
                if let Some(addr) = self.find_by_name(name) {
                    tracing::info!("Server {} already running at {}", name, addr);
                    return Ok(Member::new(name, addr));
                }
                name.to_string()
            }
            None => self.unique_name()?,
        };

        let addr = format!("{}:{}", self.host, self.free_port()?);

        let child = Command::new(&self.binary)
            .arg("--id")
            .arg(&name)
            .arg("--bind")
            .arg(&addr)
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary.display()))?;

        tracing::info!(
            "Spawned server {} at {} (pid {:?})",
            name,
            addr,
            child.id()
        );

        self.children.insert(
            addr.clone(),
            RunningNode {
                name: name.clone(),
                child,
            },
        );

        Ok(Member::new(name, addr))
    }

    async fn teardown(&self, addr: &str) -> Result<()> {
        match self.children.remove(addr) {
            Some((_, mut node)) => {
                node.child
                    .kill()
                    .await
                    .with_context(|| format!("Failed to stop server {}", node.name))?;
                tracing::info!("Stopped server {} at {}", node.name, addr);
            }
            None => {
                tracing::warn!("Server at {} does not exist", addr);
            }
        }

        Ok(())
    }

    async fn is_ready(&self, addr: &str) -> bool {
        self.probe.check(addr).await
    }
}

//! In-process stand-ins for backend nodes, shared by the unit tests.
//!
//! `MockProvisioner` serves every node with the real backend router on an
//! ephemeral localhost port, so dispatch goes over actual HTTP while liveness
//! and provisioning failures stay under the test's control.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend;
use crate::membership::service::MembershipManager;
use crate::membership::types::Member;
use crate::provisioner::{NodeProvisioner, ReadinessPolicy};
use crate::ring::RingConfig;

#[derive(Default)]
pub struct MockProvisioner {
    servers: DashMap<String, JoinHandle<()>>,
    dead: DashSet<String>,
    failing: AtomicUsize,
    unready: AtomicUsize,
    counter: AtomicUsize,
    torn_down: Mutex<Vec<String>>,
}

fn take(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

impl MockProvisioner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn spawn_members(&self, count: usize) -> Vec<Member> {
        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            members.push(self.provision(None).await.expect("mock provision"));
        }
        members
    }

    /// The next `count` provision calls return an error.
    pub fn fail_next(&self, count: usize) {
        self.failing.store(count, Ordering::SeqCst);
    }

    /// The next `count` provisioned nodes never report ready.
    pub fn unready_next(&self, count: usize) {
        self.unready.store(count, Ordering::SeqCst);
    }

    /// Makes the node fail its health checks from now on.
    pub fn kill(&self, addr: &str) {
        self.dead.insert(addr.to_string());
    }

    /// A node that passes health checks but refuses connections.
    pub async fn ghost(&self, name: &str) -> Member {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ghost port");
        let addr = listener.local_addr().expect("ghost addr").to_string();
        drop(listener);

        self.servers.insert(addr.clone(), tokio::spawn(async {}));
        Member::new(name, addr)
    }

    pub fn is_running(&self, addr: &str) -> bool {
        self.servers.contains_key(addr)
    }

    pub fn provisioned(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn torn_down(&self) -> Vec<String> {
        self.torn_down.lock().expect("torn_down lock").clone()
    }
}

#[async_trait]
impl NodeProvisioner for MockProvisioner {
    async fn provision(&self, name: Option<&str>) -> Result<Member> {
        if take(&self.failing) {
            return Err(anyhow::anyhow!("provisioning refused"));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("mock{}", n));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();
        let app = backend::app(&name);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        self.servers.insert(addr.clone(), handle);

        if take(&self.unready) {
            self.dead.insert(addr.clone());
        }

        Ok(Member::new(name, addr))
    }

    async fn teardown(&self, addr: &str) -> Result<()> {
        if let Some((_, handle)) = self.servers.remove(addr) {
            handle.abort();
        }
        self.torn_down
            .lock()
            .expect("torn_down lock")
            .push(addr.to_string());
        Ok(())
    }

    async fn is_ready(&self, addr: &str) -> bool {
        self.servers.contains_key(addr) && !self.dead.contains(addr)
    }
}

pub fn fast_readiness() -> ReadinessPolicy {
    ReadinessPolicy {
        timeout: Duration::from_millis(300),
        interval: Duration::from_millis(20),
    }
}

/// A manager over `count` freshly spawned mock nodes.
pub async fn mock_cluster(
    count: usize,
    ring_config: RingConfig,
) -> (Arc<MockProvisioner>, Arc<MembershipManager>) {
    let provisioner = MockProvisioner::new();
    let members = provisioner.spawn_members(count).await;
    let manager = MembershipManager::new(
        ring_config,
        fast_readiness(),
        provisioner.clone(),
        members,
    )
    .expect("initial ring");

    (provisioner, manager)
}

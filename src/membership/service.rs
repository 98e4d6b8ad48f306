use rand::Rng;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, RwLock};

use super::types::{
    AddOutcome, ClusterView, Member, MembershipError, ProvisionFailure, RemoveOutcome, addresses,
};
use crate::provisioner::{NodeProvisioner, ReadinessPolicy, wait_until_ready};
use crate::ring::{Ring, RingConfig};

static SERVER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("server name pattern is valid"));

/// Sole owner of the cluster membership.
///
/// Readers get immutable `ClusterView` snapshots. Every mutation goes through
/// `commit`, which holds `mutation` while it copies the list, rebuilds the ring
/// and swaps the view. Provisioning, readiness polling and teardown always run
/// outside that lock.
pub struct MembershipManager {
    ring_config: RingConfig,
    readiness: ReadinessPolicy,
    provisioner: Arc<dyn NodeProvisioner>,
    view: RwLock<Arc<ClusterView>>,
    mutation: Mutex<()>,
}

impl MembershipManager {
    /// Starts from `initial`, which is trusted to be already running.
    pub fn new(
        ring_config: RingConfig,
        readiness: ReadinessPolicy,
        provisioner: Arc<dyn NodeProvisioner>,
        initial: Vec<Member>,
    ) -> Result<Arc<Self>, MembershipError> {
        let ring = Ring::build(&ring_config, &addresses(&initial))?;

        tracing::info!(
            "Cluster starts with {} servers ({} hash, {:?} probing, {} slots x {} vnodes)",
            initial.len(),
            ring.hash_name(),
            ring.probe(),
            ring.capacity(),
            ring.vnodes()
        );

        Ok(Arc::new(Self {
            ring_config,
            readiness,
            provisioner,
            view: RwLock::new(Arc::new(ClusterView {
                members: initial,
                ring,
            })),
            mutation: Mutex::new(()),
        }))
    }

    pub async fn view(&self) -> Arc<ClusterView> {
        self.view.read().await.clone()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.view().await.members.clone()
    }

    pub fn provisioner(&self) -> &Arc<dyn NodeProvisioner> {
        &self.provisioner
    }

    /// Provisions `n` nodes (named ones first) and adds those that become ready.
    pub async fn add_nodes(
        &self,
        n: i64,
        names: &[String],
    ) -> Result<AddOutcome, MembershipError> {
        let view = self.view().await;
        let count = validate_add(&view, n, names)?;

        let mut ready = Vec::new();
        let mut failed = Vec::new();

        for i in 0..count {
            match self.provision_ready(names.get(i).map(String::as_str)).await {
                Ok(member) => ready.push(member),
                Err(failure) => failed.push(failure),
            }
        }

        if ready.is_empty() {
            return Ok(AddOutcome {
                members: self.members().await,
                added: vec![],
                failed,
            });
        }

        let committed = self
            .commit(|members| {
                let mut added = Vec::new();
                let mut clashing = Vec::new();

                for member in &ready {
                    if members.iter().any(|existing| {
                        existing.matches(&member.name) || existing.addr == member.addr
                    }) {
                        clashing.push(member.clone());
                    } else {
                        members.push(member.clone());
                        added.push(member.clone());
                    }
                }

                (added, clashing)
            })
            .await;

        let (view, (added, clashing)) = match committed {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Failed to rebuild ring with {} new servers: {}", ready.len(), e);
                self.teardown_all(&ready).await;
                return Err(e);
            }
        };

        // A concurrent add may have claimed the same name after validation.
        for member in &clashing {
            failed.push(ProvisionFailure {
                name: Some(member.name.clone()),
                addr: Some(member.addr.clone()),
                reason: format!("'{}' already exists in the hash ring", member.name),
            });
        }
        self.teardown_all(&clashing).await;

        tracing::info!(
            "Added {} servers, {} failed, cluster size now: {}",
            added.len(),
            failed.len(),
            view.len()
        );

        Ok(AddOutcome {
            members: view.members.clone(),
            added,
            failed,
        })
    }

    /// Removes `n` nodes: the named ones first, then random ones.
    ///
    /// Names that are not members are skipped and do not count toward `n`.
    pub async fn remove_nodes(
        &self,
        n: i64,
        names: &[String],
    ) -> Result<RemoveOutcome, MembershipError> {
        let view = self.view().await;
        let count = validate_remove(&view, n, names)?;

        let (view, removed) = self
            .commit(|members| {
                let mut removed = Vec::new();

                for name in names {
                    if removed.len() == count {
                        break;
                    }
                    if let Some(pos) = members.iter().position(|member| member.matches(name)) {
                        removed.push(members.remove(pos));
                    }
                }

                let mut rng = rand::thread_rng();
                while removed.len() < count && !members.is_empty() {
                    let idx = rng.gen_range(0..members.len());
                    removed.push(members.remove(idx));
                }

                removed
            })
            .await?;

        self.teardown_all(&removed).await;

        tracing::info!(
            "Removed {} servers, cluster size now: {}",
            removed.len(),
            view.len()
        );

        Ok(RemoveOutcome {
            members: view.members.clone(),
            removed,
        })
    }

    /// Drops a dead node and tears it down.
    ///
    /// Returns `None` when the node was already gone, e.g. evicted by a
    /// concurrent request that hit the same dead node.
    pub async fn evict(&self, addr: &str) -> Result<Option<Member>, MembershipError> {
        if !self.view().await.contains(addr) {
            return Ok(None);
        }

        let (view, evicted) = self
            .commit(|members| {
                members
                    .iter()
                    .position(|member| member.addr == addr)
                    .map(|pos| members.remove(pos))
            })
            .await?;

        if let Some(member) = &evicted {
            tracing::warn!(
                "Removed dead server {} at {}, cluster size now: {}",
                member.name,
                member.addr,
                view.len()
            );
            self.teardown_all(std::slice::from_ref(member)).await;
        }

        Ok(evicted)
    }

    /// Provisions one unnamed node and adds it once it is ready.
    ///
    /// A replacement that never becomes ready is not an error: the cluster just
    /// stays one node smaller and `None` is returned.
    pub async fn replace(&self) -> Result<Option<Member>, MembershipError> {
        let member = match self.provision_ready(None).await {
            Ok(member) => member,
            Err(failure) => {
                tracing::error!("Replacement server failed: {}", failure.reason);
                return Ok(None);
            }
        };

        let committed = self
            .commit(|members| {
                if members.iter().any(|existing| existing.matches(&member.name)) {
                    false
                } else {
                    members.push(member.clone());
                    true
                }
            })
            .await;

        match committed {
            Ok((view, true)) => {
                tracing::info!(
                    "Replacement server {} at {} joined, cluster size now: {}",
                    member.name,
                    member.addr,
                    view.len()
                );
                Ok(Some(member))
            }
            Ok((_, false)) => {
                tracing::warn!("Replacement name {} already taken", member.name);
                self.teardown_all(std::slice::from_ref(&member)).await;
                Ok(None)
            }
            Err(e) => {
                self.teardown_all(std::slice::from_ref(&member)).await;
                Err(e)
            }
        }
    }

    async fn provision_ready(&self, name: Option<&str>) -> Result<Member, ProvisionFailure> {
        let member = match self.provisioner.provision(name).await {
            Ok(member) => member,
            Err(e) => {
                tracing::error!("Failed to provision server {:?}: {}", name, e);
                return Err(ProvisionFailure {
                    name: name.map(str::to_string),
                    addr: None,
                    reason: e.to_string(),
                });
            }
        };

        if wait_until_ready(self.provisioner.as_ref(), &member.addr, self.readiness).await {
            return Ok(member);
        }

        tracing::error!(
            "New server {} at {} did not become ready in time",
            member.name,
            member.addr
        );
        self.teardown_all(std::slice::from_ref(&member)).await;

        Err(ProvisionFailure {
            name: Some(member.name),
            addr: Some(member.addr),
            reason: format!("not ready within {:?}", self.readiness.timeout),
        })
    }

    async fn teardown_all(&self, members: &[Member]) {
        for member in members {
            if let Err(e) = self.provisioner.teardown(&member.addr).await {
                tracing::error!("Failed to tear down {} at {}: {}", member.name, member.addr, e);
            }
        }
    }

    /// Applies `change` to a copy of the member list and swaps in the rebuilt view.
    ///
    /// If the ring cannot be built the copy is discarded and the current view stays.
    async fn commit<T, F>(&self, change: F) -> Result<(Arc<ClusterView>, T), MembershipError>
    where
        F: FnOnce(&mut Vec<Member>) -> T,
    {
        let _guard = self.mutation.lock().await;

        let mut members = self.view().await.members.clone();
        let result = change(&mut members);
        let ring = Ring::build(&self.ring_config, &addresses(&members))?;

        let view = Arc::new(ClusterView { members, ring });
        *self.view.write().await = view.clone();

        Ok((view, result))
    }
}

fn validate_add(view: &ClusterView, n: i64, names: &[String]) -> Result<usize, MembershipError> {
    if n <= 0 || names.len() as i64 > n {
        return Err(MembershipError::Validation(
            "Invalid n or hostname list length exceeds n".to_string(),
        ));
    }

    let needed = (view.len() as u128 + n as u128) * view.ring.vnodes() as u128;
    if needed > view.ring.capacity() as u128 {
        return Err(MembershipError::Validation(format!(
            "Adding {} servers exceeds the ring capacity of {} slots",
            n,
            view.ring.capacity()
        )));
    }

    let mut requested = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(MembershipError::Validation(
                "Server name cannot be empty".to_string(),
            ));
        }
        if !SERVER_NAME.is_match(name) {
            return Err(MembershipError::Validation(format!(
                "'{}' is not a valid server name",
                name
            )));
        }
        if !requested.insert(name.as_str()) {
            return Err(MembershipError::Validation(format!(
                "'{}' is requested more than once",
                name
            )));
        }
        if view.members.iter().any(|member| member.matches(name)) {
            return Err(MembershipError::Validation(format!(
                "'{}' already exists in the hash ring",
                name
            )));
        }
    }

    Ok(n as usize)
}

fn validate_remove(view: &ClusterView, n: i64, names: &[String]) -> Result<usize, MembershipError> {
    if n <= 0 || n as usize > view.len() || names.len() as i64 > n {
        return Err(MembershipError::Validation(
            "Invalid n or hostname list length exceeds n".to_string(),
        ));
    }

    Ok(n as usize)
}

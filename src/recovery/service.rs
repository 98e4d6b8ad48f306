use rand::Rng;
use std::sync::Arc;

use super::types::{RecoveryError, Routed};
use crate::membership::service::MembershipManager;
use crate::ring::RequestKey;
use crate::router::service::RequestRouter;
use crate::router::types::RouteOutcome;

/// Six-digit request id used when the client does not pin a key.
pub fn random_request_key() -> RequestKey {
    RequestKey::Int(rand::thread_rng().gen_range(100_000..=999_999))
}

pub struct RecoveryLoop {
    router: RequestRouter,
    membership: Arc<MembershipManager>,
}

impl RecoveryLoop {
    pub fn new(router: RequestRouter, membership: Arc<MembershipManager>) -> Arc<Self> {
        Arc::new(Self { router, membership })
    }

    /// Routes a client-pinned `key`, recovering dead nodes along the way.
    ///
    /// The same key is used for every attempt; after an eviction it simply
    /// lands on whichever node the rebuilt ring assigns.
    pub async fn handle(&self, key: &RequestKey) -> Result<Routed, RecoveryError> {
        self.run(|| key.clone()).await
    }

    /// Routes an unkeyed request, drawing a fresh random key for every attempt.
    pub async fn handle_random(&self) -> Result<Routed, RecoveryError> {
        self.run(random_request_key).await
    }

    async fn run<F>(&self, mut next_key: F) -> Result<Routed, RecoveryError>
    where
        F: FnMut() -> RequestKey,
    {
        let budget = self.membership.view().await.len();
        let mut attempts = 0;
        // Node whose dispatch failed on the previous attempt.
        let mut unreachable: Option<String> = None;

        while attempts < budget {
            attempts += 1;
            let key = next_key();

            match self.router.route(&key).await {
                RouteOutcome::Dispatched { addr, response } => {
                    return Ok(Routed {
                        addr,
                        attempts,
                        response,
                    });
                }
                RouteOutcome::NodeDead(addr) => {
                    unreachable = None;
                    tracing::warn!("[FAILURE DETECTED] Server at {} is not responding", addr);
                    self.recover(&addr).await;
                }
                RouteOutcome::Transient(addr) => {
                    if unreachable.as_deref() == Some(addr.as_str()) {
                        unreachable = None;
                        tracing::warn!(
                            "[FAILURE DETECTED] Server at {} failed dispatch twice in a row",
                            addr
                        );
                        self.recover(&addr).await;
                    } else {
                        tracing::debug!(
                            "Attempt {}/{} to {} failed, retrying",
                            attempts,
                            budget,
                            addr
                        );
                        unreachable = Some(addr);
                    }
                }
                RouteOutcome::NoNode(miss) => {
                    tracing::error!("Request {} has no server to go to: {:?}", key, miss);
                    return Err(RecoveryError::NoHealthyNode { attempts });
                }
            }
        }

        tracing::error!("No healthy server found after {} attempts", attempts);
        Err(RecoveryError::NoHealthyNode { attempts })
    }

    /// Evicts `addr` and provisions a replacement.
    ///
    /// Only the request that actually evicted the node provisions a
    /// replacement, so concurrent requests hitting the same dead node
    /// add exactly one.
    async fn recover(&self, addr: &str) {
        let evicted = match self.membership.evict(addr).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                tracing::debug!("{} already evicted by another request", addr);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to evict {}: {}", addr, e);
                return;
            }
        };

        match self.membership.replace().await {
            Ok(Some(member)) => tracing::info!(
                "[RECOVERY] Replaced {} with {} at {}",
                evicted.name,
                member.name,
                member.addr
            ),
            Ok(None) => tracing::error!(
                "[RECOVERY] No replacement for {}, cluster runs degraded",
                evicted.name
            ),
            Err(e) => tracing::error!("[RECOVERY] Replacing {} failed: {}", evicted.name, e),
        }
    }
}

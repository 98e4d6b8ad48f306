use anyhow::Result;
use std::sync::Arc;

use super::types::{BackendResponse, RouteOutcome, RouterConfig};
use crate::backend::ENDPOINT_HOME;
use crate::membership::service::MembershipManager;
use crate::ring::RequestKey;

pub struct RequestRouter {
    membership: Arc<MembershipManager>,
    http_client: reqwest::Client,
    config: RouterConfig,
}

impl RequestRouter {
    pub fn new(membership: Arc<MembershipManager>, config: RouterConfig) -> Self {
        Self {
            membership,
            http_client: reqwest::Client::new(),
            config,
        }
    }

    /// Routes `key` once against the current ring snapshot.
    ///
    /// The snapshot is held for the whole attempt, so a concurrent rebuild
    /// cannot change which node this attempt talks to.
    pub async fn route(&self, key: &RequestKey) -> RouteOutcome {
        let view = self.membership.view().await;

        let addr = match view.ring.lookup(key) {
            Ok(addr) => addr.to_string(),
            Err(miss) => {
                tracing::warn!("No server for request {}: {:?}", key, miss);
                return RouteOutcome::NoNode(miss);
            }
        };

        if !self.membership.provisioner().is_ready(&addr).await {
            return RouteOutcome::NodeDead(addr);
        }

        match self.dispatch(&addr).await {
            Ok(response) => {
                tracing::debug!(
                    "Request {} served by {} ({})",
                    key,
                    addr,
                    response.status
                );
                RouteOutcome::Dispatched { addr, response }
            }
            Err(e) => {
                tracing::warn!("Failed to route request {} to {}: {}", key, addr, e);
                tokio::time::sleep(self.config.transient_delay).await;
                RouteOutcome::Transient(addr)
            }
        }
    }

    async fn dispatch(&self, addr: &str) -> Result<BackendResponse> {
        let resp = self
            .http_client
            .get(format!("http://{}{}", addr, ENDPOINT_HOME))
            .timeout(self.config.dispatch_timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?.to_vec();

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}

use std::time::Duration;

use super::NodeProvisioner;

/// Bounded wait applied to freshly provisioned nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(500),
        }
    }
}

/// Polls `is_ready` until it succeeds or the policy's deadline passes.
///
/// Returns `false` at the deadline even if a health check is still in flight.
pub async fn wait_until_ready(
    provisioner: &dyn NodeProvisioner,
    addr: &str,
    policy: ReadinessPolicy,
) -> bool {
    let poll = async {
        // tokio::time::interval panics on a zero period.
        let mut interval = tokio::time::interval(policy.interval.max(Duration::from_millis(1)));

        loop {
            interval.tick().await;
            if provisioner.is_ready(addr).await {
                return;
            }
            tracing::debug!("{} not ready yet", addr);
        }
    };

    match tokio::time::timeout(policy.timeout, poll).await {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!("{} not ready after {:?}", addr, policy.timeout);
            false
        }
    }
}

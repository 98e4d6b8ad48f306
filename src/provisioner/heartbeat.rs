use std::time::Duration;

/// Path every backend answers with `200 OK` while healthy.
pub const ENDPOINT_HEARTBEAT: &str = "/heartbeat";

/// HTTP liveness check against a backend's heartbeat endpoint.
#[derive(Debug, Clone)]
pub struct HeartbeatProbe {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HeartbeatProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn check(&self, addr: &str) -> bool {
        let url = format!("http://{}{}", addr, ENDPOINT_HEARTBEAT);

        match self.http_client.get(url).timeout(self.timeout).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                tracing::debug!("Heartbeat to {} failed: {}", addr, e);
                false
            }
        }
    }
}

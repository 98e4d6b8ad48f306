//! Backend Server
//!
//! The minimal service the balancer fronts. Each instance identifies itself on
//! `/home` and answers `/heartbeat` while it is healthy.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::provisioner::heartbeat::ENDPOINT_HEARTBEAT;

/// The only path the balancer forwards client requests to.
pub const ENDPOINT_HOME: &str = "/home";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeResponse {
    pub message: String,
    pub status: String,
}

pub fn app(server_id: &str) -> Router {
    Router::new()
        .route(ENDPOINT_HOME, get(handle_home))
        .route(ENDPOINT_HEARTBEAT, get(handle_heartbeat))
        .with_state(Arc::new(server_id.to_string()))
}

async fn handle_home(State(server_id): State<Arc<String>>) -> (StatusCode, Json<HomeResponse>) {
    tracing::debug!("Serving /home as {}", server_id);

    (
        StatusCode::OK,
        Json(HomeResponse {
            message: format!("Hello from Server: {}", server_id),
            status: "successful".to_string(),
        }),
    )
}

async fn handle_heartbeat() -> StatusCode {
    StatusCode::OK
}

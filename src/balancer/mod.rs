//! Balancer HTTP API
//!
//! The public face of the load balancer: membership inspection and scaling
//! (`/rep`, `/add`, `/rm`) plus request forwarding on `/home`. Any other path is
//! answered with a `400` failure envelope.

pub mod handlers;
pub mod protocol;

use axum::{
    Router,
    extract::Extension,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::backend::ENDPOINT_HOME;
use crate::membership::service::MembershipManager;
use crate::recovery::service::RecoveryLoop;
use handlers::{handle_add, handle_home, handle_rep, handle_rm, handle_unsupported};
use protocol::{ENDPOINT_ADD, ENDPOINT_REP, ENDPOINT_RM};

pub fn app(membership: Arc<MembershipManager>, recovery: Arc<RecoveryLoop>) -> Router {
    Router::new()
        .route(ENDPOINT_REP, get(handle_rep))
        .route(ENDPOINT_ADD, post(handle_add))
        .route(ENDPOINT_RM, delete(handle_rm))
        .route(ENDPOINT_HOME, get(handle_home))
        .fallback(handle_unsupported)
        .layer(Extension(membership))
        .layer(Extension(recovery))
}

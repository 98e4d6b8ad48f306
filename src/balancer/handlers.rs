use axum::{
    Json,
    body::Body,
    extract::{Extension, Query, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::protocol::{AddReport, Envelope, HomeQuery, RemoveReport, ReplicaSet, ScaleRequest};
use crate::membership::service::MembershipManager;
use crate::membership::types::MembershipError;
use crate::recovery::service::RecoveryLoop;
use crate::ring::RequestKey;
use crate::router::types::BackendResponse;

fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    (status, Json(Envelope::failure(error))).into_response()
}

fn membership_failure(e: MembershipError) -> Response {
    match e {
        MembershipError::Validation(_) => {
            tracing::warn!("Rejected scaling request: {}", e);
            failure(StatusCode::BAD_REQUEST, e)
        }
        MembershipError::Ring(_) => {
            tracing::error!("Scaling failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn handle_rep(Extension(membership): Extension<Arc<MembershipManager>>) -> Response {
    let view = membership.view().await;
    (
        StatusCode::OK,
        Json(Envelope::successful(ReplicaSet::of(&view.members))),
    )
        .into_response()
}

pub async fn handle_add(
    Extension(membership): Extension<Arc<MembershipManager>>,
    payload: Result<Json<ScaleRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::warn!("Malformed /add body: {}", e);
            return failure(StatusCode::BAD_REQUEST, e.body_text());
        }
    };

    match membership.add_nodes(req.n, &req.hostnames).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(Envelope::successful(AddReport {
                replicas: ReplicaSet::of(&outcome.members),
                added: outcome.added,
                failed: outcome.failed,
            })),
        )
            .into_response(),
        Err(e) => membership_failure(e),
    }
}

pub async fn handle_rm(
    Extension(membership): Extension<Arc<MembershipManager>>,
    payload: Result<Json<ScaleRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::warn!("Malformed /rm body: {}", e);
            return failure(StatusCode::BAD_REQUEST, e.body_text());
        }
    };

    match membership.remove_nodes(req.n, &req.hostnames).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(Envelope::successful(RemoveReport {
                replicas: ReplicaSet::of(&outcome.members),
                removed: outcome.removed,
            })),
        )
            .into_response(),
        Err(e) => membership_failure(e),
    }
}

pub async fn handle_home(
    Extension(recovery): Extension<Arc<RecoveryLoop>>,
    Query(query): Query<HomeQuery>,
) -> Response {
    let result = match &query.key {
        Some(key) => recovery.handle(&RequestKey::parse(key)).await,
        None => recovery.handle_random().await,
    };

    match result {
        Ok(routed) => {
            tracing::debug!(
                "Request answered by {} after {} attempts",
                routed.addr,
                routed.attempts
            );
            relay(routed.response)
        }
        Err(e) => {
            tracing::error!("Request {:?} failed: {}", query.key, e);
            failure(StatusCode::SERVICE_UNAVAILABLE, "No healthy server found")
        }
    }
}

pub async fn handle_unsupported(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    failure(
        StatusCode::BAD_REQUEST,
        format!("'{}' endpoint not supported", path),
    )
}

/// Passes a backend reply through with its status, content type and body.
fn relay(backend: BackendResponse) -> Response {
    let mut response = Response::new(Body::from(backend.body));
    *response.status_mut() =
        StatusCode::from_u16(backend.status).unwrap_or(StatusCode::BAD_GATEWAY);

    if let Some(content_type) = backend.content_type
        && let Ok(value) = HeaderValue::from_str(&content_type)
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    response
}

//! Middleware — admin gate.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tgstash_common::error::StashError;

use crate::{AppState, auth};

/// Reject admin requests that lack valid Basic credentials (when the gate is enabled).
pub async fn admin_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StashError> {
    if !auth::is_authorized(request.headers(), &state.config.admin) {
        tracing::debug!(path = %request.uri().path(), "Admin request rejected");
        return Err(StashError::Unauthorized);
    }

    Ok(next.run(request).await)
}

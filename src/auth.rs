use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// Admin gate for mutating routes - expects `Authorization: Bearer <admin password>`.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::admin_auth))
/// Passes every request through when no admin password is configured.
#[instrument(skip(state, req, next))]
pub async fn admin_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.admin_password.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!(uri = %req.uri(), "Missing Authorization header on admin route");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let password = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    if password != expected {
        warn!(uri = %req.uri(), "Wrong admin password");
        return Err(AppError::Unauthorized("Wrong password".to_string()));
    }

    debug!(uri = %req.uri(), "Admin request authorized");
    Ok(next.run(req).await)
}

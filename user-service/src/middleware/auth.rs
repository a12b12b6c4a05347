use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    models::{RoleName, UserWithRole},
    services::auth::CREDENTIALS_ERROR,
    AppState,
};

pub const SUPER_ADMIN: &[RoleName] = &[RoleName::SuperAdmin];
pub const REPORTING_USER: &[RoleName] = &[RoleName::ReportingUser];

/// Authenticated caller, placed in request extensions by `require_scopes`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserWithRole);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.user.id
    }
}

/// Rejects the request unless it carries a valid bearer token whose user's
/// role grants every scope in `required`.
pub async fn require_scopes(
    State(state): State<AppState>,
    required: &'static [RoleName],
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            tracing::warn!(path = %req.uri().path(), "Missing bearer token");
            AppError::Unauthorized(anyhow::anyhow!(CREDENTIALS_ERROR))
        })?;

    let record = state
        .auth_service
        .authenticate_and_authorize(&token, required)
        .await?;

    req.extensions_mut().insert(CurrentUser(record));

    Ok(next.run(req).await)
}

/// Token from an `Authorization` value. The scheme is matched without regard
/// to case.
fn bearer_token(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!(CREDENTIALS_ERROR)))
    }
}

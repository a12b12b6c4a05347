use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    dtos::auth::TokenResponse,
    models::{RoleName, UserWithRole},
    scopes,
    services::{JwtService, ServiceError, Store},
    utils::{verify_password, Password},
};

pub const CREDENTIALS_ERROR: &str = "Could not validate credentials";
pub const PERMISSION_ERROR: &str = "Not enough permissions";

/// Login, token refresh and the per-request guard.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Exchanges username and password for an access/refresh pair. The token
    /// scopes are the role's scopes, narrowed to `requested` when non-empty.
    pub async fn login(
        &self,
        username: &str,
        password: &Password,
        requested: &[String],
    ) -> Result<TokenResponse, ServiceError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let password_ok = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false);

        if !password_ok {
            tracing::warn!(user_id = user.id, "Login rejected: incorrect password");
            return Err(ServiceError::Validation("Password is incorrect".to_string()));
        }

        let granted = self.granted_scopes(user.id).await?;
        let scopes = if requested.is_empty() {
            granted
        } else {
            granted
                .intersection(&scopes::parse_scopes(requested))
                .copied()
                .collect()
        };
        let scopes = scopes::to_scope_strings(&scopes);

        let access_token = self
            .jwt
            .generate_access_token(&user.username, user.id, scopes.clone())?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(&user.username, user.id, scopes)?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(TokenResponse::bearer(access_token, Some(refresh_token)))
    }

    /// Issues a new access token from a refresh token, with scopes recomputed
    /// from the user's current role.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        let user = self
            .store
            .find_user_by_id(claims.id)
            .await?
            .ok_or_else(|| ServiceError::Authentication(CREDENTIALS_ERROR.to_string()))?;

        let scopes = scopes::to_scope_strings(&self.granted_scopes(user.id).await?);
        let access_token = self
            .jwt
            .generate_access_token(&user.username, user.id, scopes)?;

        Ok(TokenResponse::bearer(access_token, None))
    }

    /// Resolves the caller behind `token` and checks that their role grants
    /// every scope in `required`. Scopes come from the stored role, not from
    /// the token, so role changes apply immediately.
    pub async fn authenticate_and_authorize(
        &self,
        token: &str,
        required: &[RoleName],
    ) -> Result<UserWithRole, ServiceError> {
        let claims = self.jwt.validate_access_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected access token");
            ServiceError::Authentication(CREDENTIALS_ERROR.to_string())
        })?;

        let record = self
            .store
            .find_user_with_role(claims.id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = claims.id, "Token subject no longer exists");
                ServiceError::Authentication(CREDENTIALS_ERROR.to_string())
            })?;

        let granted = record
            .role_name
            .map(scopes::expand_role)
            .unwrap_or_default();

        if let Some(missing) = required.iter().find(|scope| !granted.contains(*scope)) {
            tracing::warn!(
                user_id = record.user.id,
                missing_scope = missing.scope(),
                "Insufficient scope"
            );
            return Err(ServiceError::Authorization(PERMISSION_ERROR.to_string()));
        }

        Ok(record)
    }

    async fn granted_scopes(&self, user_id: i32) -> Result<BTreeSet<RoleName>, ServiceError> {
        Ok(self
            .store
            .find_user_with_role(user_id)
            .await?
            .and_then(|r| r.role_name)
            .map(scopes::expand_role)
            .unwrap_or_default())
    }
}

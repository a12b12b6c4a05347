use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validators::lowercase_trimmed;

/// OAuth2 password-grant style login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(deserialize_with = "lowercase_trimmed")]
    pub username: String,
    pub password: String,
    /// Space separated scopes the caller asks for. Empty means all granted.
    #[serde(default)]
    pub scope: String,
}

impl LoginForm {
    pub fn requested_scopes(&self) -> Vec<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

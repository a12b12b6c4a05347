use serde::Deserialize;
use validator::Validate;

use crate::models::RoleName;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    pub role_name: RoleName,
    #[validate(length(min = 1, max = 30, message = "Role description must be 1-30 characters"))]
    pub role_description: String,
}

/// PUT body: every column is replaced.
pub type UpdateRoleRequest = CreateRoleRequest;

#[derive(Debug, Deserialize, Validate)]
pub struct PatchRoleRequest {
    pub role_name: Option<RoleName>,
    #[validate(length(min = 1, max = 30, message = "Role description must be 1-30 characters"))]
    pub role_description: Option<String>,
}

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, Role, RoleFields, User, UserProfile, UserWithRole};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the backend detail text.
    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Typed access to roles and users. Every method is a single statement, so
/// the backend's constraints are the final word on uniqueness and references.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn insert_role(&self, fields: &RoleFields) -> Result<Role, StoreError>;
    async fn find_role(&self, id: i32) -> Result<Option<Role>, StoreError>;
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn update_role(&self, id: i32, fields: &RoleFields) -> Result<Option<Role>, StoreError>;
    async fn delete_role(&self, id: i32) -> Result<bool, StoreError>;

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;
    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_with_role(&self, id: i32) -> Result<Option<UserWithRole>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn delete_user(&self, id: i32) -> Result<bool, StoreError>;

    /// Overwrites the editable profile columns and marks the user active.
    async fn update_user_profile(
        &self,
        id: i32,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError>;

    async fn set_user_role(&self, user_id: i32, role_id: i32) -> Result<bool, StoreError>;

    /// Sets the password, clears `email_otp` and flips `email_verified`, but
    /// only while the email is unverified and `otp` still matches. Returns
    /// whether a row changed.
    async fn complete_email_verification(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Stores a fresh reset OTP and marks the password unverified.
    async fn set_password_otp(&self, id: i32, otp: &str) -> Result<bool, StoreError>;

    /// Reset counterpart of `complete_email_verification`.
    async fn complete_password_reset(
        &self,
        id: i32,
        otp: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError>;
}

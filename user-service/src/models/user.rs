//! User model as stored in `usr_user`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::RoleName;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub profile_image: Option<String>,
    pub email_otp: Option<String>,
    pub email_verified: bool,
    pub password_otp: Option<String>,
    pub password_verified: bool,
    pub is_active: bool,
    pub role_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            contact: self.contact.clone(),
            username: self.username.clone(),
            company_name: self.company_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            postal_code: self.postal_code.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// A user joined with its (optional) role.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithRole {
    #[sqlx(flatten)]
    pub user: User,
    pub role_name: Option<RoleName>,
}

/// Columns written when a user first registers.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub email_otp: String,
}

/// Editable profile columns. Saving a profile also marks the user active.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
    pub username: String,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub profile_image: Option<String>,
}

/// Public view of a user. Credentials and OTP state never leave the service.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
    pub username: String,
    pub email: String,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub profile_image: Option<String>,
    pub email_verified: bool,
    pub password_verified: bool,
    pub is_active: bool,
    pub role_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            contact: u.contact,
            username: u.username,
            email: u.email,
            company_name: u.company_name,
            address: u.address,
            city: u.city,
            country: u.country,
            postal_code: u.postal_code,
            profile_image: u.profile_image,
            email_verified: u.email_verified,
            password_verified: u.password_verified,
            is_active: u.is_active,
            role_id: u.role_id,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

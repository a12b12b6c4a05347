//! Role model and the closed set of role names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef, Postgres};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five built-in roles, declared from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    SuperAdmin,
    Admin,
    Manager,
    User,
    ReportingUser,
}

#[derive(Debug, Error)]
#[error("Unknown role name: {0}")]
pub struct UnknownRoleName(pub String);

impl RoleName {
    pub const ALL: [RoleName; 5] = [
        RoleName::SuperAdmin,
        RoleName::Admin,
        RoleName::Manager,
        RoleName::User,
        RoleName::ReportingUser,
    ];

    /// Stored form, e.g. `super_admin`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "super_admin",
            RoleName::Admin => "admin",
            RoleName::Manager => "manager",
            RoleName::User => "user",
            RoleName::ReportingUser => "reporting_user",
        }
    }

    /// Scope form carried in tokens, e.g. `SUPER_ADMIN`.
    pub fn scope(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "SUPER_ADMIN",
            RoleName::Admin => "ADMIN",
            RoleName::Manager => "MANAGER",
            RoleName::User => "USER",
            RoleName::ReportingUser => "REPORTING_USER",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            RoleName::SuperAdmin => "Super Admin Description",
            RoleName::Admin => "Admin Description",
            RoleName::Manager => "Manager Description",
            RoleName::User => "User Description",
            RoleName::ReportingUser => "Reporting User Description",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both the stored and the scope spelling, ignoring ASCII case.
impl FromStr for RoleName {
    type Err = UnknownRoleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleName::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRoleName(s.to_string()))
    }
}

impl sqlx::Type<Postgres> for RoleName {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for RoleName {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as sqlx::Decode<Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub role_name: RoleName,
    pub role_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for inserting or fully replacing a role.
#[derive(Debug, Clone)]
pub struct RoleFields {
    pub role_name: RoleName,
    pub role_description: String,
}

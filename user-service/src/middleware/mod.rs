pub mod auth;

pub use auth::{require_scopes, CurrentUser, REPORTING_USER, SUPER_ADMIN};

//! Services layer for user-service.
//!
//! Business logic for authentication, user and role management, plus the
//! store and email boundaries they run on.

pub mod auth;
mod database;
mod email;
pub mod error;
mod jwt;
mod mock_store;
pub mod role;
mod store;
pub mod user;

pub use auth::AuthService;
pub use database::Database;
pub use email::{EmailMessage, EmailProvider, EmailService, MockEmailService};
pub use error::ServiceError;
pub use jwt::{JwtService, OtpClaims, SessionClaims, TokenError, TokenKind, OTP_EXPIRY_FORMAT};
pub use mock_store::MockStore;
pub use role::RoleService;
pub use store::{Store, StoreError};
pub use user::UserService;

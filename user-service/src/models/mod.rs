pub mod role;
pub mod user;

pub use role::{Role, RoleFields, RoleName, UnknownRoleName};
pub use user::{NewUser, User, UserProfile, UserResponse, UserWithRole};

pub mod otp;
pub mod password;
pub mod validation;
pub mod validators;

pub use otp::generate_otp;
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::{PathParam, ValidatedForm, ValidatedJson};

use serde::Deserialize;
use validator::Validate;

use crate::utils::validators::{
    lowercase_trimmed, lowercase_trimmed_opt, validate_contact, validate_name, validate_password,
    validate_trimmed, validate_username,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "lowercase_trimmed")]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,
}

/// Completes either OTP flow: the challenge token from the emailed link plus
/// the password to set.
#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(
        length(min = 8, max = 30, message = "Password must be 8-30 characters"),
        custom(function = "validate_password")
    )]
    pub password: String,
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetRoleRequest {
    pub user_id: i32,
    pub role_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, max = 30, message = "Password must be 8-30 characters"))]
    pub old_password: String,
    #[validate(
        length(min = 8, max = 30, message = "Password must be 8-30 characters"),
        custom(function = "validate_password")
    )]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestPasswordReset {
    #[serde(deserialize_with = "lowercase_trimmed")]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,
}

/// PUT body. Names are required; absent optional columns are cleared.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 30), custom(function = "validate_name"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30), custom(function = "validate_name"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 30), custom(function = "validate_contact"))]
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "lowercase_trimmed_opt")]
    #[validate(length(min = 1, max = 30), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_trimmed"))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub profile_image: Option<String>,
}

/// PATCH body. Only the fields present are changed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchUserRequest {
    #[validate(length(min = 1, max = 30), custom(function = "validate_name"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_name"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_contact"))]
    pub contact: Option<String>,
    #[serde(default, deserialize_with = "lowercase_trimmed_opt")]
    #[validate(length(min = 1, max = 30), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_trimmed"))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 30), custom(function = "validate_trimmed"))]
    pub postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub profile_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_normalises_and_validates_email() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":" Jane.Doe@Example.com "}"#).unwrap();
        assert_eq!(req.email, "jane.doe@example.com");
        assert!(req.validate().is_ok());

        let bad: RegisterRequest = serde_json::from_str(r#"{"email":"not-an-email"}"#).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn email_longer_than_column_is_rejected() {
        let email = format!("{}@{}.example.com", "a".repeat(60), "b".repeat(45));
        assert!(email.len() > 100);

        let register = RegisterRequest { email: email.clone() };
        let errors = register.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let reset = RequestPasswordReset { email };
        assert!(reset.validate().is_err());
    }

    #[test]
    fn set_password_request_enforces_strength() {
        let weak: SetPasswordRequest =
            serde_json::from_str(r#"{"password":"password","token":"t"}"#).unwrap();
        assert!(weak.validate().is_err());

        let strong: SetPasswordRequest =
            serde_json::from_str(r#"{"password":"Abc12345#","token":"t"}"#).unwrap();
        assert!(strong.validate().is_ok());
    }

    #[test]
    fn patch_request_validates_only_present_fields() {
        let patch: PatchUserRequest = serde_json::from_str(r#"{"city":"Pune"}"#).unwrap();
        assert!(patch.validate().is_ok());
        assert!(patch.first_name.is_none());

        let bad: PatchUserRequest = serde_json::from_str(r#"{"first_name":"J0hn"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}

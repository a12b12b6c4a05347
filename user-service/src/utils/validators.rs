//! Field validators shared by the request DTOs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

const PASSWORD_SPECIALS: &str = "@$!%*?&#^()_+-/";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("valid username regex"));

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("valid name regex"));

static CONTACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\d{3}[-. ]\d{3}[-. ]\d{4}|",
        r"\(\d{2,3}\)[-. ]\d{3,4}[-. ]\d{4}|",
        r"\+\d{1,2}[-. ]\(\d{3}\)[-. ]\d{3}[-. ]\d{4}|",
        r"\+\d{1,2}\(\d{3}\)[-. ]\d{3}[-. ]\d{4}|",
        r"\+\d{1,2}[-. ]\d{3}[-. ]\d{3}[-. ]\d{4}|",
        r"\+\d{1,2}\d{10}",
    ))
    .expect("valid contact regex")
});

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Requires lower, upper, digit and special characters, and nothing outside
/// letters, digits and the allowed specials. Length is checked separately.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);

    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(is_special);

    if allowed && has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(error(
            "password_strength",
            "Password should contain at least one uppercase, one lowercase, one digit and one special character",
        ))
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(error(
            "username",
            "Username can only contain alphabets, numbers, underscore, dot and hyphen",
        ))
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(error("name", "Only alphabets are allowed"))
    }
}

pub fn validate_contact(contact: &str) -> Result<(), ValidationError> {
    if CONTACT_RE.is_match(contact) {
        Ok(())
    } else {
        Err(error("contact", "Contact number should be in proper format"))
    }
}

/// Free text must not start or end with whitespace.
pub fn validate_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim() == value {
        Ok(())
    } else {
        Err(error("whitespace", "Value should not start or end with space"))
    }
}

/// Emails and usernames are compared case-insensitively, so they are
/// normalised as they are read.
pub fn lowercase_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_lowercase())
}

pub fn lowercase_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(validate_password("Abc12345#").is_ok());
        assert!(validate_password("abc12345#").is_err());
        assert!(validate_password("ABC12345#").is_err());
        assert!(validate_password("Abcdefgh#").is_err());
        assert!(validate_password("Abc123456").is_err());
        assert!(validate_password("Abc 12345#").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("john.doe-99_x").is_ok());
        assert!(validate_username("john doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("John").is_ok());
        assert!(validate_name("John2").is_err());
    }

    #[test]
    fn contact_formats() {
        assert!(validate_contact("123-456-7890").is_ok());
        assert!(validate_contact("(02) 123-4567").is_ok());
        assert!(validate_contact("+1 (234) 567-8901").is_ok());
        assert!(validate_contact("+911234567890").is_ok());
        assert!(validate_contact("call me").is_err());
    }

    #[test]
    fn trimmed_rule() {
        assert!(validate_trimmed("Acme Inc").is_ok());
        assert!(validate_trimmed(" Acme").is_err());
        assert!(validate_trimmed("Acme ").is_err());
    }

    #[test]
    fn email_is_normalised_on_read() {
        #[derive(Deserialize)]
        struct EmailHolder {
            #[serde(deserialize_with = "lowercase_trimmed")]
            email: String,
        }

        let holder: EmailHolder = serde_json::from_str(r#"{"email":"  John@Example.COM "}"#).unwrap();
        assert_eq!(holder.email, "john@example.com");
    }
}

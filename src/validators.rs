//! Request-body validation for the registration and login flows.
//!
//! Every check runs so a rejected request reports the full list of
//! violations rather than the first one encountered.

use lazy_static::lazy_static;
use regex::Regex;

use crate::routes::{LoginRequest, RegisterRequest};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_USERNAME_LENGTH: usize = 100;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// A single field-level validation failure, serialized into 400 responses.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validates a registration payload. The optional photo reference is
/// client-supplied and deliberately left unchecked.
pub fn validate_registration(request: &RegisterRequest) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    check_username(request.username.trim(), &mut violations);
    check_email(request.email.trim(), &mut violations);
    check_password(&request.password, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validates a login payload. Only shape is checked here; credential
/// correctness is the login flow's concern.
pub fn validate_login(request: &LoginRequest) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    check_email(request.email.trim(), &mut violations);
    if request.password.is_empty() {
        violations.push(Violation::new("password", "password is required"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_username(username: &str, violations: &mut Vec<Violation>) {
    if username.is_empty() {
        violations.push(Violation::new("username", "username is required"));
        return;
    }

    if username.len() > MAX_USERNAME_LENGTH {
        violations.push(Violation::new(
            "username",
            format!(
                "username is too long (maximum {} characters)",
                MAX_USERNAME_LENGTH
            ),
        ));
    }

    if username.chars().any(|c| c.is_control()) {
        violations.push(Violation::new(
            "username",
            "username contains control characters",
        ));
    }
}

fn check_email(email: &str, violations: &mut Vec<Violation>) {
    if email.is_empty() {
        violations.push(Violation::new("email", "email is required"));
        return;
    }

    if email.len() < MIN_EMAIL_LENGTH || email.len() > MAX_EMAIL_LENGTH {
        violations.push(Violation::new(
            "email",
            format!(
                "email must be between {} and {} characters",
                MIN_EMAIL_LENGTH, MAX_EMAIL_LENGTH
            ),
        ));
        return;
    }

    if !EMAIL_REGEX.is_match(email) {
        violations.push(Violation::new("email", "email has invalid format"));
    }
}

// Passwords are not trimmed: leading or trailing whitespace is part of the
// secret. Length is measured in bytes, matching the hasher's input limit.
fn check_password(password: &str, violations: &mut Vec<Violation>) {
    if password.is_empty() {
        violations.push(Violation::new("password", "password is required"));
        return;
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        violations.push(Violation::new(
            "password",
            format!(
                "password is too short (minimum {} characters)",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        violations.push(Violation::new(
            "password",
            format!(
                "password is too long (maximum {} characters)",
                MAX_PASSWORD_LENGTH
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            photo: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_registration() {
        let request = register_request("ana", "a@x.com", "p@ss1234");
        assert!(validate_registration(&request).is_ok());
    }

    #[test]
    fn rejects_invalid_email_formats() {
        for email in ["invalid", "user@", "@example.com", "user@@example.com"] {
            let request = register_request("ana", email, "p@ss1234");
            let violations = validate_registration(&request).unwrap_err();
            assert!(
                violations.iter().any(|v| v.field == "email"),
                "expected email violation for {:?}",
                email
            );
        }
    }

    #[test]
    fn rejects_short_and_oversized_passwords() {
        let request = register_request("ana", "a@x.com", "short");
        let violations = validate_registration(&request).unwrap_err();
        assert!(violations.iter().any(|v| v.field == "password"));

        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        let request = register_request("ana", "a@x.com", &long);
        let violations = validate_registration(&request).unwrap_err();
        assert!(violations.iter().any(|v| v.field == "password"));
    }

    #[test]
    fn does_not_require_character_classes_in_passwords() {
        // Length is the only password rule at this boundary.
        let request = register_request("ana", "a@x.com", "alllowercase");
        assert!(validate_registration(&request).is_ok());
    }

    #[test]
    fn reports_every_violation_at_once() {
        let request = register_request("", "nope", "x");
        let violations = validate_registration(&request).unwrap_err();

        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[test]
    fn rejects_control_characters_in_usernames() {
        let request = register_request("ana\0", "a@x.com", "p@ss1234");
        let violations = validate_registration(&request).unwrap_err();
        assert!(violations.iter().any(|v| v.field == "username"));
    }

    #[test]
    fn login_requires_both_fields() {
        let request = LoginRequest {
            email: "".to_string(),
            password: "".to_string(),
        };
        let violations = validate_login(&request).unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn login_accepts_valid_credentials_shape() {
        let request = LoginRequest {
            email: "a@x.com".to_string(),
            password: "p@ss1234".to_string(),
        };
        assert!(validate_login(&request).is_ok());
    }
}

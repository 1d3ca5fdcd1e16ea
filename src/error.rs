//! Unified error handling for the service.
//!
//! Component errors (store, hasher, token issuer, validators) convert into
//! [`AppError`], and every failure is translated at the flow boundary into the
//! JSON envelope `{success: false, message, errors?, error?}`. Internal
//! diagnostics are truncated and only echoed outside production.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::{PasswordError, TokenError};
use crate::configuration::Environment;
use crate::validators::Violation;

/// How much of an internal diagnostic may reach a development client.
const MAX_DETAIL_LEN: usize = 200;

/// Authentication failures surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    UserNotFound,
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    MissingToken,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "User not found",
            AuthError::InvalidCredentials => "Incorrect email or password",
            AuthError::TokenExpired | AuthError::TokenInvalid => "Invalid or expired token",
            AuthError::MissingToken => "Missing authentication token",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl StdError for AuthError {}

/// Credential store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateEmail,
    Unavailable(String),
    Unexpected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateEmail => write!(f, "email already registered"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Unexpected(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Central error type all flow failures map to.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<Violation>),
    Auth(AuthError),
    Store(StoreError),
    TokenSigning(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(violations) => {
                write!(f, "validation failed ({} violations)", violations.len())
            }
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::TokenSigning(msg) => write!(f, "token signing failed: {}", msg),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<Vec<Violation>> for AppError {
    fn from(violations: Vec<Violation>) -> Self {
        AppError::Validation(violations)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::Auth(AuthError::TokenExpired),
            TokenError::Invalid => AppError::Auth(AuthError::TokenInvalid),
            TokenError::Signing(msg) => AppError::TokenSigning(msg),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            // A stored hash bcrypt cannot parse is a data-integrity fault,
            // not a credential mismatch.
            PasswordError::MalformedHash => {
                AppError::Internal("stored credential failed integrity check".to_string())
            }
            PasswordError::EmptyPassword => {
                AppError::Internal("attempted to hash an empty password".to_string())
            }
            PasswordError::Hashing(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(_: actix_web::error::BlockingError) -> Self {
        AppError::Internal("background hashing task was cancelled".to_string())
    }
}

/// Response envelope for any failed request.
#[derive(serde::Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [Violation]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 401 envelope used by the token gate, which replies before a flow handler
/// ever runs.
pub fn unauthorized_response(err: AuthError) -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorEnvelope {
        success: false,
        message: err.message(),
        errors: None,
        error: None,
    })
}

/// Flow-boundary error: an [`AppError`] plus the deployment environment that
/// decides whether diagnostics are echoed. Constructed by handlers so that
/// error rendering never reaches for ambient global state.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    environment: Environment,
    server_message: &'static str,
}

impl ApiError {
    pub fn new(error: impl Into<AppError>, environment: Environment) -> Self {
        Self {
            error: error.into(),
            environment,
            server_message: "Request failed. Try again",
        }
    }

    /// Message used for 5xx envelopes of this flow.
    pub fn with_server_message(mut self, message: &'static str) -> Self {
        self.server_message = message;
        self
    }

    fn detail(&self) -> Option<String> {
        if self.environment.is_production() {
            return None;
        }
        let detail = match &self.error {
            AppError::Store(StoreError::Unavailable(msg))
            | AppError::Store(StoreError::Unexpected(msg))
            | AppError::TokenSigning(msg)
            | AppError::Internal(msg) => msg,
            _ => return None,
        };
        Some(detail.chars().take(MAX_DETAIL_LEN).collect())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::UserNotFound) => StatusCode::NOT_FOUND,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::DuplicateEmail) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::TokenSigning(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "request failed");
        } else {
            tracing::warn!(error = %self.error, "request rejected");
        }

        let (message, errors): (&str, Option<&[Violation]>) = match &self.error {
            AppError::Validation(violations) => ("Validation failed", Some(violations.as_slice())),
            AppError::Auth(e) => (e.message(), None),
            AppError::Store(StoreError::DuplicateEmail) => ("Email already registered", None),
            _ => (self.server_message, None),
        };

        HttpResponse::build(status).json(ErrorEnvelope {
            success: false,
            message,
            errors,
            error: self.detail(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation() -> Violation {
        Violation {
            field: "email",
            message: "email has invalid format".to_string(),
        }
    }

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = vec![
            (
                ApiError::new(vec![violation()], Environment::Development),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::new(AuthError::UserNotFound, Environment::Development),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::new(AuthError::InvalidCredentials, Environment::Development),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::new(StoreError::DuplicateEmail, Environment::Development),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::new(
                    StoreError::Unavailable("pool timed out".to_string()),
                    Environment::Development,
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::new(
                    AppError::TokenSigning("bad key".to_string()),
                    Environment::Development,
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected);
        }
    }

    #[test]
    fn diagnostics_are_suppressed_in_production() {
        let err = ApiError::new(
            StoreError::Unexpected("connection reset by peer".to_string()),
            Environment::Production,
        );
        assert!(err.detail().is_none());

        let err = ApiError::new(
            StoreError::Unexpected("connection reset by peer".to_string()),
            Environment::Development,
        );
        assert_eq!(err.detail().unwrap(), "connection reset by peer");
    }

    #[test]
    fn diagnostics_are_truncated() {
        let long = "x".repeat(1000);
        let err = ApiError::new(
            AppError::Internal(long),
            Environment::Development,
        );
        assert_eq!(err.detail().unwrap().len(), MAX_DETAIL_LEN);
    }

    #[test]
    fn client_faults_carry_no_diagnostics() {
        let err = ApiError::new(AuthError::InvalidCredentials, Environment::Development);
        assert!(err.detail().is_none());
    }

    #[test]
    fn token_errors_map_onto_auth_kinds() {
        match AppError::from(TokenError::Expired) {
            AppError::Auth(AuthError::TokenExpired) => (),
            other => panic!("unexpected mapping: {:?}", other),
        }
        match AppError::from(TokenError::Invalid) {
            AppError::Auth(AuthError::TokenInvalid) => (),
            other => panic!("unexpected mapping: {:?}", other),
        }
        match AppError::from(TokenError::Signing("boom".to_string())) {
            AppError::TokenSigning(_) => (),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn malformed_hash_is_an_integrity_fault_not_a_mismatch() {
        match AppError::from(PasswordError::MalformedHash) {
            AppError::Internal(_) => (),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }
}

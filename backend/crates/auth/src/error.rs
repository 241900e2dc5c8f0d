//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. Credential failures are reported
//! without disclosing whether the account exists; rate-limit and lock
//! rejections disclose retry timing, which is intentional.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::domain::token::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Brute-force guard block
    #[error("Too many failed attempts, try again later")]
    Locked { retry_after_secs: u64 },

    /// Rate limit exceeded
    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    /// Malicious or malformed input
    #[error("Request rejected: {0}")]
    ValidationRejected(String),

    /// Token missing, malformed, expired, or of the wrong kind
    #[error("Invalid or expired token")]
    TokenRejected(#[from] TokenError),

    /// Session revoked, expired, or unknown
    #[error("Session is no longer valid")]
    SessionInvalid,

    /// Valid identity, insufficient permission
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Second factor needed to complete this login
    #[error("Two-factor authentication required")]
    SecondFactorRequired,

    /// Wrong TOTP or backup code
    #[error("Invalid two-factor code")]
    SecondFactorInvalid,

    /// Role mandates 2FA but the user has not enrolled
    #[error("Two-factor authentication not set up")]
    SecondFactorNotEnrolled,

    /// Account disabled or suspended
    #[error("Account is not active")]
    AccountInactive,

    /// Email already registered
    #[error("Email is already registered")]
    EmailTaken,

    /// User not found (admin lookups only, never login)
    #[error("User not found")]
    UserNotFound,

    /// Password policy violation
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::TokenRejected(_)
            | AuthError::SessionInvalid
            | AuthError::SecondFactorInvalid => StatusCode::UNAUTHORIZED,
            AuthError::Locked { .. } => StatusCode::LOCKED,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::ValidationRejected(_) | AuthError::PasswordValidation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Forbidden(_) | AuthError::AccountInactive => StatusCode::FORBIDDEN,
            AuthError::SecondFactorRequired => StatusCode::PRECONDITION_REQUIRED,
            AuthError::SecondFactorNotEnrolled => StatusCode::PRECONDITION_FAILED,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::TokenRejected(_)
            | AuthError::SessionInvalid
            | AuthError::SecondFactorInvalid => ErrorKind::Unauthorized,
            AuthError::Locked { .. } => ErrorKind::Locked,
            AuthError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AuthError::ValidationRejected(_) | AuthError::PasswordValidation(_) => {
                ErrorKind::BadRequest
            }
            AuthError::Forbidden(_) | AuthError::AccountInactive => ErrorKind::Forbidden,
            AuthError::SecondFactorRequired => ErrorKind::PreconditionRequired,
            AuthError::SecondFactorNotEnrolled => ErrorKind::PreconditionFailed,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Retry timing to disclose, when applicable
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AuthError::Locked { retry_after_secs }
            | AuthError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self.retry_after_secs() {
            Some(secs) => err.with_retry_after(secs),
            None => err,
        }
    }

    /// Log the error with appropriate level.
    ///
    /// Security-relevant rejections go to the `security` target so the
    /// audit trail can be filtered independently of application noise.
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!(target: "security", "Invalid login attempt");
            }
            AuthError::Locked { retry_after_secs } => {
                tracing::warn!(target: "security", retry_after_secs, "Login attempt while locked out");
            }
            AuthError::RateLimited { retry_after_secs } => {
                tracing::warn!(target: "security", retry_after_secs, "Rate limit exceeded");
            }
            AuthError::ValidationRejected(reason) => {
                tracing::warn!(target: "security", %reason, "Malicious input rejected");
            }
            AuthError::SecondFactorInvalid => {
                tracing::warn!(target: "security", "Invalid second-factor code");
            }
            // The response is a uniform 401; the audit trail keeps the
            // distinct failure reason
            AuthError::TokenRejected(inner) => {
                tracing::debug!(target: "security", reason = %inner, "Token rejected");
            }
            AuthError::Forbidden(reason) => {
                tracing::warn!(target: "security", %reason, "Permission denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::PasswordValidation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Locked {
                retry_after_secs: 60
            }
            .status_code(),
            StatusCode::LOCKED
        );
        assert_eq!(
            AuthError::RateLimited {
                retry_after_secs: 10
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::SecondFactorRequired.status_code().as_u16(),
            428
        );
        assert_eq!(
            AuthError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_wire_status_matches_status_code() {
        // The response travels through to_app_error(); its status must
        // agree with status_code() for every variant a client sees
        for err in [
            AuthError::InvalidCredentials,
            AuthError::Locked {
                retry_after_secs: 60,
            },
            AuthError::RateLimited {
                retry_after_secs: 10,
            },
            AuthError::SecondFactorRequired,
            AuthError::SecondFactorNotEnrolled,
            AuthError::SecondFactorInvalid,
            AuthError::SessionInvalid,
            AuthError::EmailTaken,
            AuthError::AccountInactive,
        ] {
            assert_eq!(
                err.to_app_error().status_code(),
                err.status_code().as_u16(),
                "{err}"
            );
        }
    }

    #[test]
    fn test_retry_after_disclosure() {
        assert_eq!(
            AuthError::Locked {
                retry_after_secs: 120
            }
            .retry_after_secs(),
            Some(120)
        );
        assert_eq!(AuthError::InvalidCredentials.retry_after_secs(), None);
    }

    #[test]
    fn test_token_errors_map_to_unauthorized() {
        for e in [
            TokenError::Malformed,
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::NotYetValid,
            TokenError::KindMismatch,
        ] {
            let err = AuthError::from(e);
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            // The response message never discloses which check failed
            assert_eq!(err.to_string(), "Invalid or expired token");
        }
    }
}

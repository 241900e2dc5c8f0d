//! TOTP Enrollment Entity
//!
//! Per-user second-factor state. A secret exists in the pending state
//! from setup until the user confirms with a valid code; only then is
//! the enrollment enabled and backup codes issued.

use chrono::{DateTime, Utc};

use kernel::id::UserId;

use crate::domain::value_object::totp_secret::TotpSecret;

/// TOTP enrollment entity
#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    /// Reference to User
    pub user_id: UserId,
    /// Shared secret
    pub secret: TotpSecret,
    /// Whether enrollment was confirmed with a valid code
    pub enabled: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl TotpEnrollment {
    /// Start a new pending enrollment with a fresh secret
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            secret: TotpSecret::generate(),
            enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Confirm enrollment after code verification
    pub fn enable(&mut self) {
        self.enabled = true;
        self.updated_at = Utc::now();
    }
}

/// A stored backup code hash with its consumption state
#[derive(Debug, Clone)]
pub struct StoredBackupCode {
    pub code_hash: String,
    pub consumed: bool,
}

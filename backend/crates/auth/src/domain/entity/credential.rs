//! Credential Entity
//!
//! Password credential for a user, separated from the User entity to
//! isolate sensitive data. Failed-attempt tracking is handled by the
//! lockout guard, keyed on email + source IP, not stored here.

use chrono::{DateTime, Utc};

use kernel::id::UserId;
use platform::password::HashedPassword;

/// Password credential entity
#[derive(Debug, Clone)]
pub struct Credential {
    /// Reference to User
    pub user_id: UserId,
    /// Argon2id password hash (PHC string)
    pub password_hash: HashedPassword,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create new credential
    pub fn new(user_id: UserId, password_hash: HashedPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the password hash
    pub fn update_password(&mut self, new_hash: HashedPassword) {
        self.password_hash = new_hash;
        self.updated_at = Utc::now();
    }
}

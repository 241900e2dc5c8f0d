//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer; use cases depend only on these traits.

use crate::domain::entity::{
    credential::Credential,
    session::Session,
    totp_enrollment::{StoredBackupCode, TotpEnrollment},
    user::User,
};
use crate::domain::value_object::{email::Email, public_id::PublicId};
use crate::error::AuthResult;
use kernel::id::{SessionId, UserId};

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create_user(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_user_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Find user by public ID
    async fn find_user_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>>;

    /// Find user by email (login identifier)
    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Update user
    async fn update_user(&self, user: &User) -> AuthResult<()>;
}

/// Password credential repository trait
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    /// Create credential
    async fn create_credential(&self, credential: &Credential) -> AuthResult<()>;

    /// Find credential by user ID
    async fn find_credential(&self, user_id: UserId) -> AuthResult<Option<Credential>>;

    /// Update credential
    async fn update_credential(&self, credential: &Credential) -> AuthResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Create a new session
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    /// Return the session only if neither revoked nor expired, bumping
    /// `last_activity` as a side effect. The read and the touch must be
    /// atomic per key so a concurrent revoke is never missed.
    async fn get_valid_session(&self, session_id: SessionId) -> AuthResult<Option<Session>>;

    /// All sessions for a user, newest first (including revoked/expired)
    async fn find_sessions_by_user(&self, user_id: UserId) -> AuthResult<Vec<Session>>;

    /// Replace the refresh hash and expiry after rotation
    async fn rotate_session_refresh(
        &self,
        session_id: SessionId,
        refresh_hash: &str,
        expires_at_ms: i64,
    ) -> AuthResult<()>;

    /// Revoke one session (idempotent)
    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()>;

    /// Revoke all sessions for a user, optionally sparing one;
    /// returns the number revoked
    async fn revoke_all_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
    ) -> AuthResult<u64>;

    /// Delete expired and revoked rows; returns removed count
    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// TOTP enrollment repository trait
#[trait_variant::make(TotpRepository: Send)]
pub trait LocalTotpRepository {
    /// Insert or replace the pending enrollment for a user
    async fn upsert_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()>;

    /// Find enrollment by user ID
    async fn find_enrollment(&self, user_id: UserId) -> AuthResult<Option<TotpEnrollment>>;

    /// Mark the enrollment enabled after confirmation
    async fn enable_enrollment(&self, user_id: UserId) -> AuthResult<()>;

    /// Delete enrollment and backup codes
    async fn delete_enrollment(&self, user_id: UserId) -> AuthResult<()>;

    /// Replace the user's backup code hashes
    async fn replace_backup_codes(&self, user_id: UserId, hashes: &[String]) -> AuthResult<()>;

    /// List stored backup codes with consumption state
    async fn find_backup_codes(&self, user_id: UserId) -> AuthResult<Vec<StoredBackupCode>>;

    /// Atomically consume an unconsumed code matching the hash.
    /// Returns true exactly once per code; a second call with the same
    /// hash returns false.
    async fn consume_backup_code(&self, user_id: UserId, code_hash: &str) -> AuthResult<bool>;
}

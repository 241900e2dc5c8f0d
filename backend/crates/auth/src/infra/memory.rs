//! In-Memory Repository Implementations
//!
//! Backing store for use-case tests. Mirrors the PostgreSQL semantics,
//! including the atomic read-with-touch on session lookup and the
//! single-use backup code consumption.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use kernel::id::{SessionId, UserId};

use crate::domain::entity::{
    credential::Credential,
    session::Session,
    totp_enrollment::{StoredBackupCode, TotpEnrollment},
    user::User,
};
use crate::domain::repository::{
    CredentialRepository, SessionRepository, TotpRepository, UserRepository,
};
use crate::domain::value_object::{email::Email, public_id::PublicId};
use crate::error::AuthResult;

/// In-memory auth repository
#[derive(Debug, Default)]
pub struct InMemoryAuthRepository {
    users: Mutex<HashMap<UserId, User>>,
    credentials: Mutex<HashMap<UserId, Credential>>,
    sessions: Mutex<HashMap<SessionId, Session>>,
    enrollments: Mutex<HashMap<UserId, TotpEnrollment>>,
    backup_codes: Mutex<HashMap<UserId, Vec<StoredBackupCode>>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .expect("user table poisoned")
            .insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .expect("user table poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn find_user_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .expect("user table poisoned")
            .values()
            .find(|u| u.public_id.as_str() == public_id.as_str())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .expect("user table poisoned")
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self
            .users
            .lock()
            .expect("user table poisoned")
            .values()
            .any(|u| u.email == *email))
    }

    async fn update_user(&self, user: &User) -> AuthResult<()> {
        self.users
            .lock()
            .expect("user table poisoned")
            .insert(user.user_id, user.clone());
        Ok(())
    }
}

impl CredentialRepository for InMemoryAuthRepository {
    async fn create_credential(&self, credential: &Credential) -> AuthResult<()> {
        self.credentials
            .lock()
            .expect("credential table poisoned")
            .insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn find_credential(&self, user_id: UserId) -> AuthResult<Option<Credential>> {
        Ok(self
            .credentials
            .lock()
            .expect("credential table poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn update_credential(&self, credential: &Credential) -> AuthResult<()> {
        self.credentials
            .lock()
            .expect("credential table poisoned")
            .insert(credential.user_id, credential.clone());
        Ok(())
    }
}

impl SessionRepository for InMemoryAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .lock()
            .expect("session table poisoned")
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn get_valid_session(&self, session_id: SessionId) -> AuthResult<Option<Session>> {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        match sessions.get_mut(&session_id) {
            Some(s) if s.is_valid() => {
                s.touch();
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_sessions_by_user(&self, user_id: UserId) -> AuthResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .expect("session table poisoned")
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.last_activity_at));
        Ok(sessions)
    }

    async fn rotate_session_refresh(
        &self,
        session_id: SessionId,
        refresh_hash: &str,
        expires_at_ms: i64,
    ) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        if let Some(s) = sessions.get_mut(&session_id) {
            s.rotate_refresh(refresh_hash, expires_at_ms);
        }
        Ok(())
    }

    async fn revoke_session(&self, session_id: SessionId) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        if let Some(s) = sessions.get_mut(&session_id) {
            s.revoke();
        }
        Ok(())
    }

    async fn revoke_all_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
    ) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        let mut revoked = 0;
        for s in sessions.values_mut() {
            if s.user_id == user_id && !s.revoked && Some(s.session_id) != except {
                s.revoke();
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut sessions = self.sessions.lock().expect("session table poisoned");
        let before = sessions.len();
        sessions.retain(|_, s| !s.revoked && s.expires_at_ms >= now_ms);
        Ok((before - sessions.len()) as u64)
    }
}

impl TotpRepository for InMemoryAuthRepository {
    async fn upsert_enrollment(&self, enrollment: &TotpEnrollment) -> AuthResult<()> {
        self.enrollments
            .lock()
            .expect("totp table poisoned")
            .insert(enrollment.user_id, enrollment.clone());
        Ok(())
    }

    async fn find_enrollment(&self, user_id: UserId) -> AuthResult<Option<TotpEnrollment>> {
        Ok(self
            .enrollments
            .lock()
            .expect("totp table poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn enable_enrollment(&self, user_id: UserId) -> AuthResult<()> {
        let mut enrollments = self.enrollments.lock().expect("totp table poisoned");
        if let Some(e) = enrollments.get_mut(&user_id) {
            e.enable();
        }
        Ok(())
    }

    async fn delete_enrollment(&self, user_id: UserId) -> AuthResult<()> {
        self.enrollments
            .lock()
            .expect("totp table poisoned")
            .remove(&user_id);
        self.backup_codes
            .lock()
            .expect("backup code table poisoned")
            .remove(&user_id);
        Ok(())
    }

    async fn replace_backup_codes(&self, user_id: UserId, hashes: &[String]) -> AuthResult<()> {
        let codes = hashes
            .iter()
            .map(|h| StoredBackupCode {
                code_hash: h.clone(),
                consumed: false,
            })
            .collect();
        self.backup_codes
            .lock()
            .expect("backup code table poisoned")
            .insert(user_id, codes);
        Ok(())
    }

    async fn find_backup_codes(&self, user_id: UserId) -> AuthResult<Vec<StoredBackupCode>> {
        Ok(self
            .backup_codes
            .lock()
            .expect("backup code table poisoned")
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn consume_backup_code(&self, user_id: UserId, code_hash: &str) -> AuthResult<bool> {
        let mut table = self.backup_codes.lock().expect("backup code table poisoned");
        if let Some(codes) = table.get_mut(&user_id) {
            if let Some(code) = codes
                .iter_mut()
                .find(|c| c.code_hash == code_hash && !c.consumed)
            {
                code.consumed = true;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

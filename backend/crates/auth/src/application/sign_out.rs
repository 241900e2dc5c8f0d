//! Sign Out Use Case
//!
//! Revokes sessions server-side. Tokens already issued against a
//! revoked session stop working at the next request because every
//! authenticated request checks the session row.

use std::sync::Arc;

use kernel::id::{SessionId, UserId};

use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>) -> Self {
        Self { session_repo }
    }

    /// Sign out from the current session
    pub async fn execute(&self, session_id: SessionId) -> AuthResult<()> {
        self.session_repo.revoke_session(session_id).await?;

        tracing::info!(
            target: "security",
            session_id = %session_id,
            "User signed out"
        );
        Ok(())
    }

    /// Revoke every other session for the user, keeping the current one
    pub async fn execute_all(
        &self,
        user_id: UserId,
        current_session: SessionId,
    ) -> AuthResult<u64> {
        let revoked = self
            .session_repo
            .revoke_all_sessions(user_id, Some(current_session))
            .await?;

        tracing::info!(
            target: "security",
            user_id = %user_id,
            revoked,
            "User revoked all other sessions"
        );

        Ok(revoked)
    }
}

//! Session Listing Use Case
//!
//! Lists a user's live sessions for the device management screen.

use std::sync::Arc;

use kernel::id::{SessionId, UserId};

use crate::domain::entity::session::SessionInfo;
use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

/// List sessions use case
pub struct ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
}

impl<S> ListSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>) -> Self {
        Self { session_repo }
    }

    /// Live sessions for the user, with the caller's own marked current
    pub async fn execute(
        &self,
        user_id: UserId,
        current_session: SessionId,
    ) -> AuthResult<Vec<SessionInfo>> {
        let sessions = self.session_repo.find_sessions_by_user(user_id).await?;

        Ok(sessions
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| {
                let mut info = SessionInfo::from(s);
                info.is_current = s.session_id == current_session;
                info
            })
            .collect())
    }
}

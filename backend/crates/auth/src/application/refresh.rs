//! Refresh Use Case
//!
//! Rotates a refresh token: the presented token must verify, its
//! session must still be live, and its hash must match the one stored
//! on the session. A signed token whose hash no longer matches has been
//! rotated out already, which means it was replayed; every session for
//! that user is revoked in response.

use std::sync::Arc;

use platform::crypto::constant_time_eq;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, issue_token_pair, refresh_token_hash};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::token::TokenSigner;
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

/// Refresh output
#[derive(Debug)]
pub struct RefreshOutput {
    pub tokens: TokenPair,
}

/// Refresh use case
pub struct RefreshUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    signer: TokenSigner,
    config: Arc<AuthConfig>,
}

impl<U, S> RefreshUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            signer: TokenSigner::new(config.token_secret),
            config,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let claims = self
            .signer
            .verify(refresh_token, TokenKind::Refresh, now_ms)?;

        let session = self
            .session_repo
            .get_valid_session(claims.sid)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        // A verified token that does not match the stored hash was
        // rotated out before: someone is replaying an old refresh token
        let presented = refresh_token_hash(refresh_token);
        if !constant_time_eq(presented.as_bytes(), session.refresh_hash.as_bytes()) {
            let revoked = self
                .session_repo
                .revoke_all_sessions(session.user_id, None)
                .await?;
            tracing::warn!(
                target: "security",
                user_id = %session.user_id,
                session_id = %session.session_id,
                revoked,
                "Refresh token reuse detected, all sessions revoked"
            );
            return Err(AuthError::SessionInvalid);
        }

        // Claims are re-derived from the current user row so role or
        // status changes take effect at the next refresh
        let user = self
            .user_repo
            .find_user_by_id(session.user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?;
        if !user.can_login() {
            self.session_repo.revoke_session(session.session_id).await?;
            return Err(AuthError::AccountInactive);
        }

        let tokens = issue_token_pair(
            &self.signer,
            &self.config,
            &user,
            session.session_id,
            claims.sfv,
        )?;

        let new_expiry = now_ms + self.config.refresh_ttl_ms();
        self.session_repo
            .rotate_session_refresh(
                session.session_id,
                &refresh_token_hash(&tokens.refresh_token),
                new_expiry,
            )
            .await?;

        tracing::debug!(
            session_id = %session.session_id,
            "Refresh token rotated"
        );

        Ok(RefreshOutput { tokens })
    }
}

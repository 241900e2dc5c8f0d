//! Authenticate Use Case
//!
//! Resolves a bearer access token into an [`AuthUser`]. Runs on every
//! protected request: verify the signature and claims, then confirm the
//! bound session is still live. Revocation therefore takes effect
//! within one request, not at token expiry.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::auth_user::AuthUser;
use crate::domain::repository::SessionRepository;
use crate::domain::token::TokenSigner;
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::{AuthError, AuthResult};

/// Authenticate use case
pub struct AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
    signer: TokenSigner,
}

impl<S> AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            signer: TokenSigner::new(config.token_secret),
        }
    }

    pub async fn execute(&self, access_token: &str) -> AuthResult<AuthUser> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let claims = self.signer.verify(access_token, TokenKind::Access, now_ms)?;

        // The lookup also bumps last_activity on the session row
        self.session_repo
            .get_valid_session(claims.sid)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        Ok(claims.to_auth_user())
    }
}

//! Sign In Use Case
//!
//! Authenticates a user and creates a session with a signed token pair.
//! Failed attempts feed the brute-force guard keyed on email + source
//! IP; the guard is consulted before any credential work happens.

use std::sync::Arc;

use platform::client::ClientIdentity;
use platform::lockout::LockoutStore;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::tokens::{TokenPair, issue_token_pair, refresh_token_hash};
use crate::domain::entity::session::Session;
use crate::domain::entity::totp_enrollment::TotpEnrollment;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    CredentialRepository, SessionRepository, TotpRepository, UserRepository,
};
use crate::domain::token::TokenSigner;
use crate::domain::value_object::backup_codes::hash_backup_code;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// TOTP or backup code (if 2FA is enabled)
    pub totp_code: Option<String>,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub tokens: TokenPair,
    pub user: User,
}

/// Sign in use case
pub struct SignInUseCase<U, C, S, T, L>
where
    U: UserRepository,
    C: CredentialRepository,
    S: SessionRepository,
    T: TotpRepository,
    L: LockoutStore,
{
    user_repo: Arc<U>,
    credential_repo: Arc<C>,
    session_repo: Arc<S>,
    totp_repo: Arc<T>,
    lockout: Arc<L>,
    signer: TokenSigner,
    config: Arc<AuthConfig>,
}

impl<U, C, S, T, L> SignInUseCase<U, C, S, T, L>
where
    U: UserRepository,
    C: CredentialRepository,
    S: SessionRepository,
    T: TotpRepository,
    L: LockoutStore,
{
    pub fn new(
        user_repo: Arc<U>,
        credential_repo: Arc<C>,
        session_repo: Arc<S>,
        totp_repo: Arc<T>,
        lockout: Arc<L>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credential_repo,
            session_repo,
            totp_repo,
            lockout,
            signer: TokenSigner::new(config.token_secret),
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: &ClientIdentity,
    ) -> AuthResult<SignInOutput> {
        let guard_key = client.lockout_key(&input.email);

        // Guard check comes first so blocked clients cost nothing
        let status = self
            .lockout
            .check_blocked(&guard_key)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if status.is_blocked() {
            return Err(AuthError::Locked {
                retry_after_secs: status.retry_after_secs(),
            });
        }

        // Unknown accounts and bad passwords are indistinguishable to
        // the caller, and both count against the guard
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let Some(mut user) = self.user_repo.find_user_by_email(&email).await? else {
            return Err(self.record_failure(&guard_key).await?);
        };

        let credential = self
            .credential_repo
            .find_credential(user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credential not found".to_string()))?;

        let password = ClearTextPassword::new_unchecked(input.password);
        if !credential
            .password_hash
            .verify(&password, self.config.pepper())
        {
            return Err(self.record_failure(&guard_key).await?);
        }

        // Only after the password matched: a 403 here would otherwise
        // tell an unauthenticated caller that the account exists
        if !user.can_login() {
            return Err(AuthError::AccountInactive);
        }

        // Second factor
        let enrollment = self.totp_repo.find_enrollment(user.user_id).await?;
        let second_factor_verified = match enrollment {
            Some(ref e) if e.enabled => {
                let Some(code) = input.totp_code.as_deref() else {
                    return Err(AuthError::SecondFactorRequired);
                };
                if !self.verify_second_factor(&user, e, code).await? {
                    return Err(self.record_failure(&guard_key).await?);
                }
                true
            }
            // Admin roles may not log in without an enabled second factor
            _ if user.requires_second_factor() => {
                return Err(AuthError::SecondFactorNotEnrolled);
            }
            _ => false,
        };

        self.lockout
            .clear_failures(&guard_key)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        user.record_login();
        self.user_repo.update_user(&user).await?;

        // Session first, then the pair bound to it, then the stored hash
        let mut session = Session::new(
            user.user_id,
            String::new(),
            client.device_info(),
            client.ip.map(|ip| ip.to_string()),
            self.config.refresh_ttl_chrono(),
        );
        let tokens = issue_token_pair(
            &self.signer,
            &self.config,
            &user,
            session.session_id,
            second_factor_verified,
        )?;
        session.refresh_hash = refresh_token_hash(&tokens.refresh_token);
        self.session_repo.create_session(&session).await?;

        tracing::info!(
            target: "security",
            public_id = %user.public_id,
            session_id = %session.session_id,
            ip = %client.ip_string(),
            second_factor = second_factor_verified,
            "User signed in"
        );

        Ok(SignInOutput { tokens, user })
    }

    /// Try the TOTP code first, then fall back to a one-time backup code
    async fn verify_second_factor(
        &self,
        user: &User,
        enrollment: &TotpEnrollment,
        code: &str,
    ) -> AuthResult<bool> {
        if enrollment.secret.verify(code, user.email.as_str())? {
            return Ok(true);
        }

        let consumed = self
            .totp_repo
            .consume_backup_code(user.user_id, &hash_backup_code(code))
            .await?;
        if consumed {
            tracing::warn!(
                target: "security",
                public_id = %user.public_id,
                "Backup code consumed for sign-in"
            );
        }
        Ok(consumed)
    }

    /// Record a failed attempt; the returned error reflects whether this
    /// failure tipped the key into a block
    async fn record_failure(&self, guard_key: &str) -> AuthResult<AuthError> {
        let status = self
            .lockout
            .record_failure(guard_key, &self.config.lockout)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if status.is_blocked() {
            Ok(AuthError::Locked {
                retry_after_secs: status.retry_after_secs(),
            })
        } else {
            Ok(AuthError::InvalidCredentials)
        }
    }
}

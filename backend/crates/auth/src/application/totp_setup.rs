//! TOTP Setup Use Case
//!
//! Enrollment lifecycle for the second factor: setup generates a
//! pending secret, confirm proves the authenticator works and issues
//! backup codes, disable removes the enrollment after re-verification.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::totp_enrollment::TotpEnrollment;
use crate::domain::entity::user::User;
use crate::domain::repository::{TotpRepository, UserRepository};
use crate::domain::value_object::backup_codes::{BackupCodeSet, hash_backup_code};
use crate::error::{AuthError, AuthResult};

/// TOTP setup output
pub struct TotpSetupOutput {
    /// QR code as base64-encoded PNG
    pub qr_code_base64: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// TOTP enrollment use case
pub struct TotpSetupUseCase<U, T>
where
    U: UserRepository,
    T: TotpRepository,
{
    user_repo: Arc<U>,
    totp_repo: Arc<T>,
}

impl<U, T> TotpSetupUseCase<U, T>
where
    U: UserRepository,
    T: TotpRepository,
{
    pub fn new(user_repo: Arc<U>, totp_repo: Arc<T>) -> Self {
        Self {
            user_repo,
            totp_repo,
        }
    }

    /// Start TOTP setup with a fresh pending secret.
    ///
    /// Re-running setup before confirmation replaces the pending secret.
    /// An already-enabled enrollment cannot be silently replaced; it has
    /// to be disabled first with a valid code.
    pub async fn setup(&self, user_id: UserId) -> AuthResult<TotpSetupOutput> {
        let user = self.find_user(user_id).await?;

        if let Some(existing) = self.totp_repo.find_enrollment(user_id).await? {
            if existing.enabled {
                return Err(AuthError::ValidationRejected(
                    "Two-factor authentication is already enabled".to_string(),
                ));
            }
        }

        let enrollment = TotpEnrollment::new(user_id);
        self.totp_repo.upsert_enrollment(&enrollment).await?;

        let account = user.email.as_str();
        let qr_code = enrollment.secret.generate_qr_code(account)?;
        let otpauth_url = enrollment.secret.get_otpauth_url(account)?;

        tracing::info!(
            public_id = %user.public_id,
            "TOTP setup initiated"
        );

        Ok(TotpSetupOutput {
            qr_code_base64: qr_code,
            secret: enrollment.secret.as_base32().to_string(),
            otpauth_url,
        })
    }

    /// Confirm the pending enrollment with a valid code.
    ///
    /// Returns the plaintext backup codes; this is the only time they
    /// are ever visible.
    pub async fn confirm(&self, user_id: UserId, code: &str) -> AuthResult<Vec<String>> {
        let user = self.find_user(user_id).await?;

        let enrollment = self
            .totp_repo
            .find_enrollment(user_id)
            .await?
            .ok_or(AuthError::SecondFactorNotEnrolled)?;
        if enrollment.enabled {
            return Err(AuthError::ValidationRejected(
                "Two-factor authentication is already enabled".to_string(),
            ));
        }

        if !enrollment.secret.verify(code, user.email.as_str())? {
            return Err(AuthError::SecondFactorInvalid);
        }

        self.totp_repo.enable_enrollment(user_id).await?;

        let codes = BackupCodeSet::generate();
        self.totp_repo
            .replace_backup_codes(user_id, &codes.hashes)
            .await?;

        tracing::info!(
            target: "security",
            public_id = %user.public_id,
            "TOTP enabled"
        );

        Ok(codes.plaintext)
    }

    /// Verify a TOTP or backup code for an enabled enrollment
    pub async fn verify(&self, user_id: UserId, code: &str) -> AuthResult<()> {
        let user = self.find_user(user_id).await?;

        let enrollment = self
            .totp_repo
            .find_enrollment(user_id)
            .await?
            .filter(|e| e.enabled)
            .ok_or(AuthError::SecondFactorNotEnrolled)?;

        if enrollment.secret.verify(code, user.email.as_str())? {
            return Ok(());
        }

        if self
            .totp_repo
            .consume_backup_code(user_id, &hash_backup_code(code))
            .await?
        {
            tracing::warn!(
                target: "security",
                public_id = %user.public_id,
                "Backup code consumed for verification"
            );
            return Ok(());
        }

        Err(AuthError::SecondFactorInvalid)
    }

    /// Disable TOTP after re-verifying a current code.
    ///
    /// Admin roles cannot disable their second factor.
    pub async fn disable(&self, user_id: UserId, code: &str) -> AuthResult<()> {
        let user = self.find_user(user_id).await?;

        if user.requires_second_factor() {
            return Err(AuthError::Forbidden(
                "Administrative roles cannot disable two-factor authentication".to_string(),
            ));
        }

        self.verify(user_id, code).await?;
        self.totp_repo.delete_enrollment(user_id).await?;

        tracing::info!(
            target: "security",
            public_id = %user.public_id,
            "TOTP disabled"
        );

        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> AuthResult<User> {
        self.user_repo
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

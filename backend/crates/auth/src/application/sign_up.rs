//! Sign Up Use Case
//!
//! Creates a new user account with a password credential.

use std::sync::Arc;

use access::RegionId;
use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credential::Credential, user::User};
use crate::domain::repository::{CredentialRepository, UserRepository};
use crate::domain::value_object::{display_name::DisplayName, email::Email};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub home_region: i32,
}

/// Sign up output
pub struct SignUpOutput {
    pub public_id: String,
}

/// Sign up use case
pub struct SignUpUseCase<U, C>
where
    U: UserRepository,
    C: CredentialRepository,
{
    user_repo: Arc<U>,
    credential_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C> SignUpUseCase<U, C>
where
    U: UserRepository,
    C: CredentialRepository,
{
    pub fn new(user_repo: Arc<U>, credential_repo: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            credential_repo,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(input.email)
            .map_err(|e| AuthError::ValidationRejected(e.to_string()))?;
        let display_name = DisplayName::new(&input.display_name)
            .map_err(|e| AuthError::ValidationRejected(e.to_string()))?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        // Validate against the password policy, then hash
        let password = ClearTextPassword::new(input.password)?;
        let password_hash = password.hash(self.config.pepper())?;

        // New accounts start as students in their home region
        let user = User::new(email, display_name, RegionId(input.home_region));
        let credential = Credential::new(user.user_id, password_hash);

        self.user_repo.create_user(&user).await?;
        self.credential_repo.create_credential(&credential).await?;

        tracing::info!(
            public_id = %user.public_id,
            email_domain = %user.email.domain(),
            home_region = user.home_region.0,
            "User signed up"
        );

        Ok(SignUpOutput {
            public_id: user.public_id.to_string(),
        })
    }
}

//! Flow tests for the auth crate
//!
//! Exercise the use cases end to end against the in-memory repository:
//! registration, login, lockout, refresh rotation and replay, session
//! revocation, and the TOTP enrollment lifecycle.

#[cfg(test)]
mod flow_tests {
    use std::net::IpAddr;
    use std::sync::Arc;

    use axum::http::HeaderMap;

    use platform::client::ClientIdentity;
    use platform::lockout::InMemoryLockoutStore;

    use crate::application::{
        AuthConfig, AuthenticateUseCase, ListSessionsUseCase, RefreshUseCase, SignInInput,
        SignInOutput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, TotpSetupUseCase,
    };
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::email::Email;
    use crate::domain::value_object::totp_secret::TotpSecret;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryAuthRepository;

    const EMAIL: &str = "hanako@example.com";
    const PASSWORD: &str = "Correct#Horse9";

    struct Harness {
        repo: Arc<InMemoryAuthRepository>,
        lockout: Arc<InMemoryLockoutStore>,
        config: Arc<AuthConfig>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                repo: Arc::new(InMemoryAuthRepository::new()),
                lockout: Arc::new(InMemoryLockoutStore::new()),
                config: Arc::new(AuthConfig::development()),
            }
        }

        fn client(&self) -> ClientIdentity {
            let ip: IpAddr = "203.0.113.9".parse().unwrap();
            ClientIdentity::from_request(&HeaderMap::new(), Some(ip))
        }

        async fn register(&self) {
            SignUpUseCase::new(self.repo.clone(), self.repo.clone(), self.config.clone())
                .execute(SignUpInput {
                    email: EMAIL.to_string(),
                    display_name: "橋本 花子".to_string(),
                    password: PASSWORD.to_string(),
                    home_region: 1,
                })
                .await
                .unwrap();
        }

        fn sign_in_use_case(
            &self,
        ) -> SignInUseCase<
            InMemoryAuthRepository,
            InMemoryAuthRepository,
            InMemoryAuthRepository,
            InMemoryAuthRepository,
            InMemoryLockoutStore,
        > {
            SignInUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.lockout.clone(),
                self.config.clone(),
            )
        }

        async fn sign_in(&self, password: &str, totp_code: Option<String>) -> Result<SignInOutput, AuthError> {
            self.sign_in_use_case()
                .execute(
                    SignInInput {
                        email: EMAIL.to_string(),
                        password: password.to_string(),
                        totp_code,
                    },
                    &self.client(),
                )
                .await
        }
    }

    #[tokio::test]
    async fn test_register_and_sign_in() {
        let h = Harness::new();
        h.register().await;

        let output = h.sign_in(PASSWORD, None).await.unwrap();
        assert!(!output.tokens.access_token.is_empty());
        assert!(!output.tokens.refresh_token.is_empty());
        assert_ne!(output.tokens.access_token, output.tokens.refresh_token);
        assert!(output.user.last_login_at.is_some());

        // The access token resolves to the signed-in identity
        let authenticate = AuthenticateUseCase::new(h.repo.clone(), h.config.clone());
        let auth_user = authenticate
            .execute(&output.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(auth_user.email, EMAIL);
        assert!(!auth_user.second_factor_verified);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let h = Harness::new();
        h.register().await;

        let result = SignUpUseCase::new(h.repo.clone(), h.repo.clone(), h.config.clone())
            .execute(SignUpInput {
                email: EMAIL.to_string(),
                display_name: "Another".to_string(),
                password: PASSWORD.to_string(),
                home_region: 2,
            })
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let h = Harness::new();
        h.register().await;

        let wrong = h.sign_in("WrongPass#123", None).await.unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid credentials");

        let unknown = h
            .sign_in_use_case()
            .execute(
                SignInInput {
                    email: "nobody@example.com".to_string(),
                    password: PASSWORD.to_string(),
                    totp_code: None,
                },
                &h.client(),
            )
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_suspended_account_is_not_disclosed_without_password() {
        let h = Harness::new();
        h.register().await;

        let email = Email::new(EMAIL).unwrap();
        let mut user = h.repo.find_user_by_email(&email).await.unwrap().unwrap();
        user.status = UserStatus::Suspended;
        h.repo.update_user(&user).await.unwrap();

        // Without the password the answer is the generic 401, so an
        // unauthenticated caller cannot probe for suspended accounts
        let err = h.sign_in("WrongPass#123", None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // With the correct password the true state is surfaced
        let err = h.sign_in(PASSWORD, None).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountInactive));
    }

    #[tokio::test]
    async fn test_lockout_after_repeated_failures() {
        let h = Harness::new();
        h.register().await;

        for _ in 0..5 {
            let err = h.sign_in("WrongPass#123", None).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        // The sixth failure crosses the threshold and blocks the key
        let err = h.sign_in("WrongPass#123", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Locked { .. }));

        // Even the correct password is refused while blocked
        let err = h.sign_in(PASSWORD, None).await.unwrap_err();
        assert!(matches!(err, AuthError::Locked { retry_after_secs } if retry_after_secs > 0));
    }

    #[tokio::test]
    async fn test_success_clears_failure_count() {
        let h = Harness::new();
        h.register().await;

        for _ in 0..4 {
            h.sign_in("WrongPass#123", None).await.unwrap_err();
        }
        h.sign_in(PASSWORD, None).await.unwrap();

        // Counter restarted: four more failures still do not block
        for _ in 0..4 {
            let err = h.sign_in("WrongPass#123", None).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_replay_detection() {
        let h = Harness::new();
        h.register().await;
        let output = h.sign_in(PASSWORD, None).await.unwrap();

        let refresh = RefreshUseCase::new(h.repo.clone(), h.repo.clone(), h.config.clone());

        let rotated = refresh.execute(&output.tokens.refresh_token).await.unwrap();
        assert_ne!(rotated.tokens.refresh_token, output.tokens.refresh_token);

        // The rotated-out token is now a replay; it kills every session
        let err = refresh
            .execute(&output.tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionInvalid));

        let err = refresh
            .execute(&rotated.tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionInvalid));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let h = Harness::new();
        h.register().await;
        let output = h.sign_in(PASSWORD, None).await.unwrap();

        let refresh = RefreshUseCase::new(h.repo.clone(), h.repo.clone(), h.config.clone());
        let err = refresh.execute(&output.tokens.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRejected(_)));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_access_token() {
        let h = Harness::new();
        h.register().await;
        let output = h.sign_in(PASSWORD, None).await.unwrap();

        let authenticate = AuthenticateUseCase::new(h.repo.clone(), h.config.clone());
        let auth_user = authenticate
            .execute(&output.tokens.access_token)
            .await
            .unwrap();

        SignOutUseCase::new(h.repo.clone())
            .execute(auth_user.session_id)
            .await
            .unwrap();

        let err = authenticate
            .execute(&output.tokens.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionInvalid));
    }

    #[tokio::test]
    async fn test_revoke_all_spares_current_session() {
        let h = Harness::new();
        h.register().await;

        let first = h.sign_in(PASSWORD, None).await.unwrap();
        let second = h.sign_in(PASSWORD, None).await.unwrap();

        let authenticate = AuthenticateUseCase::new(h.repo.clone(), h.config.clone());
        let current = authenticate
            .execute(&second.tokens.access_token)
            .await
            .unwrap();

        let revoked = SignOutUseCase::new(h.repo.clone())
            .execute_all(current.user_id, current.session_id)
            .await
            .unwrap();
        assert_eq!(revoked, 1);

        // The spared session still works, the other does not
        assert!(authenticate.execute(&second.tokens.access_token).await.is_ok());
        assert!(authenticate.execute(&first.tokens.access_token).await.is_err());

        let sessions = ListSessionsUseCase::new(h.repo.clone())
            .execute(current.user_id, current.session_id)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_current);
    }

    #[tokio::test]
    async fn test_totp_enrollment_gates_sign_in() {
        let h = Harness::new();
        h.register().await;
        let first = h.sign_in(PASSWORD, None).await.unwrap();

        let totp = TotpSetupUseCase::new(h.repo.clone(), h.repo.clone());
        let setup = totp.setup(first.user.user_id).await.unwrap();

        // A pending enrollment does not yet gate sign-in
        h.sign_in(PASSWORD, None).await.unwrap();

        let secret = TotpSecret::from_base32(setup.secret).unwrap();
        let code = secret.generate_current(EMAIL).unwrap();
        let backup_codes = totp.confirm(first.user.user_id, &code).await.unwrap();
        assert_eq!(backup_codes.len(), 10);

        // Enabled: missing code is refused, a valid code passes
        let err = h.sign_in(PASSWORD, None).await.unwrap_err();
        assert!(matches!(err, AuthError::SecondFactorRequired));

        let code = secret.generate_current(EMAIL).unwrap();
        let output = h.sign_in(PASSWORD, Some(code)).await.unwrap();

        let authenticate = AuthenticateUseCase::new(h.repo.clone(), h.config.clone());
        let auth_user = authenticate
            .execute(&output.tokens.access_token)
            .await
            .unwrap();
        assert!(auth_user.second_factor_verified);
    }

    #[tokio::test]
    async fn test_backup_code_is_single_use() {
        let h = Harness::new();
        h.register().await;
        let first = h.sign_in(PASSWORD, None).await.unwrap();

        let totp = TotpSetupUseCase::new(h.repo.clone(), h.repo.clone());
        let setup = totp.setup(first.user.user_id).await.unwrap();
        let secret = TotpSecret::from_base32(setup.secret).unwrap();
        let code = secret.generate_current(EMAIL).unwrap();
        let backup_codes = totp.confirm(first.user.user_id, &code).await.unwrap();

        let backup = backup_codes[0].clone();
        h.sign_in(PASSWORD, Some(backup.clone())).await.unwrap();

        // The same code again is worthless
        let err = h.sign_in(PASSWORD, Some(backup)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_totp_disable_requires_valid_code() {
        let h = Harness::new();
        h.register().await;
        let first = h.sign_in(PASSWORD, None).await.unwrap();
        let user_id = first.user.user_id;

        let totp = TotpSetupUseCase::new(h.repo.clone(), h.repo.clone());
        let setup = totp.setup(user_id).await.unwrap();
        let secret = TotpSecret::from_base32(setup.secret).unwrap();
        let code = secret.generate_current(EMAIL).unwrap();
        totp.confirm(user_id, &code).await.unwrap();

        let err = totp.disable(user_id, "000000").await.unwrap_err();
        assert!(matches!(err, AuthError::SecondFactorInvalid));

        let code = secret.generate_current(EMAIL).unwrap();
        totp.disable(user_id, &code).await.unwrap();

        // Sign-in no longer asks for a second factor
        h.sign_in(PASSWORD, None).await.unwrap();
    }
}

//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::ClientIdentity;
use platform::cookie::CookieConfig;
use platform::lockout::InMemoryLockoutStore;
use platform::rate_limit::InMemoryRateLimitStore;

use crate::application::config::AuthConfig;
use crate::application::{
    ListSessionsUseCase, RefreshUseCase, SignInInput, SignInUseCase, SignOutUseCase, SignUpInput,
    SignUpUseCase, TotpSetupUseCase,
};
use crate::domain::entity::auth_user::AuthUser;
use crate::domain::repository::{
    CredentialRepository, SessionRepository, TotpRepository, UserRepository,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    LoginRequest, LoginResponse, MeResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse,
    RevokeAllResponse, SessionListResponse, TotpConfirmRequest, TotpConfirmResponse,
    TotpDisableRequest, TotpSetupResponse, TotpVerifyRequest, UserResponse,
};

/// Everything a repository must provide to back the auth endpoints
pub trait AuthRepositories:
    UserRepository
    + CredentialRepository
    + SessionRepository
    + TotpRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepositories for T where
    T: UserRepository
        + CredentialRepository
        + SessionRepository
        + TotpRepository
        + Send
        + Sync
        + 'static
{
}

/// Shared state for auth handlers and middleware
pub struct AuthAppState<R>
where
    R: AuthRepositories,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub rate_limiter: Arc<InMemoryRateLimitStore>,
    pub lockout: Arc<InMemoryLockoutStore>,
}

impl<R> Clone for AuthAppState<R>
where
    R: AuthRepositories,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            rate_limiter: self.rate_limiter.clone(),
            lockout: self.lockout.clone(),
        }
    }
}

impl<R> AuthAppState<R>
where
    R: AuthRepositories,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            rate_limiter: Arc::new(InMemoryRateLimitStore::new()),
            lockout: Arc::new(InMemoryLockoutStore::new()),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            display_name: req.display_name,
            password: req.password,
            home_region: req.home_region,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            public_id: output.public_id,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let client = ClientIdentity::from_request(&headers, Some(addr.ip()));

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.lockout.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(
            SignInInput {
                email: req.email,
                password: req.password,
                totp_code: req.totp_code,
            },
            &client,
        )
        .await?;

    let cookie = refresh_cookie(&state.config).build_set_cookie(&output.tokens.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            access_token: output.tokens.access_token,
            refresh_token: output.tokens.refresh_token,
            user: UserResponse::from(&output.user),
        }),
    ))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
///
/// The token is read from the HttpOnly cookie (browser clients) or from
/// the request body (clients without a cookie jar).
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let refresh_token = platform::cookie::extract_cookie(&headers, "refresh_token")
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .ok_or(AuthError::SessionInvalid)?;

    let use_case = RefreshUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());
    let output = use_case.execute(&refresh_token).await?;

    let cookie = refresh_cookie(&state.config).build_set_cookie(&output.tokens.refresh_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(RefreshResponse {
            access_token: output.tokens.access_token,
        }),
    ))
}

// ============================================================================
// Logout and Session Management
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepositories,
{
    let use_case = SignOutUseCase::new(state.repo.clone());
    use_case.execute(auth_user.session_id).await?;

    let cookie = refresh_cookie(&state.config).build_delete_cookie();

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// GET /api/auth/me
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse::from(&auth_user))
}

/// GET /api/auth/sessions
pub async fn list_sessions<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
) -> AuthResult<Json<SessionListResponse>>
where
    R: AuthRepositories,
{
    let use_case = ListSessionsUseCase::new(state.repo.clone());
    let sessions = use_case
        .execute(auth_user.user_id, auth_user.session_id)
        .await?;

    Ok(Json(SessionListResponse {
        sessions: sessions.iter().map(Into::into).collect(),
    }))
}

/// POST /api/auth/sessions/revoke_all
pub async fn revoke_all_sessions<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
) -> AuthResult<Json<RevokeAllResponse>>
where
    R: AuthRepositories,
{
    let use_case = SignOutUseCase::new(state.repo.clone());
    let revoked = use_case
        .execute_all(auth_user.user_id, auth_user.session_id)
        .await?;

    Ok(Json(RevokeAllResponse { revoked }))
}

// ============================================================================
// TOTP (requires authentication)
// ============================================================================

/// POST /api/auth/totp/setup
pub async fn totp_setup<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
) -> AuthResult<Json<TotpSetupResponse>>
where
    R: AuthRepositories,
{
    let use_case = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone());
    let output = use_case.setup(auth_user.user_id).await?;

    Ok(Json(TotpSetupResponse {
        qr_code: output.qr_code_base64,
        secret: output.secret,
        otpauth_url: output.otpauth_url,
    }))
}

/// POST /api/auth/totp/confirm
pub async fn totp_confirm<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<TotpConfirmRequest>,
) -> AuthResult<Json<TotpConfirmResponse>>
where
    R: AuthRepositories,
{
    let use_case = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone());
    let backup_codes = use_case.confirm(auth_user.user_id, &req.code).await?;

    Ok(Json(TotpConfirmResponse { backup_codes }))
}

/// POST /api/auth/totp/verify
pub async fn totp_verify<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<TotpVerifyRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthRepositories,
{
    let use_case = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.verify(auth_user.user_id, &req.code).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/auth/totp/disable
pub async fn totp_disable<R>(
    State(state): State<AuthAppState<R>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<TotpDisableRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthRepositories,
{
    let use_case = TotpSetupUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.disable(auth_user.user_id, &req.code).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn refresh_cookie(config: &AuthConfig) -> CookieConfig {
    CookieConfig {
        secure: config.cookie_secure,
        same_site: config.cookie_same_site,
        ..CookieConfig::refresh_token(config.refresh_cookie_max_age())
    }
}

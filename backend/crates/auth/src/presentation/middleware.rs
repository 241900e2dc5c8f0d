//! Security Middleware
//!
//! The request pipeline for the portal API: rate limiting, request body
//! scanning, token authentication, and response security headers.
//! Layers are arranged so the cheapest rejections happen first and no
//! credential work is spent on flood traffic.

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderValue, Method, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use access::{AccessTarget, Action, Resource, check};
use platform::client::ClientIdentity;
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};
use platform::sanitize::{RiskLevel, detect};

use crate::application::AuthenticateUseCase;
use crate::domain::entity::auth_user::AuthUser;
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::{AuthAppState, AuthRepositories};

/// Largest request body the scanner will buffer
const MAX_SCAN_BYTES: usize = 1024 * 1024;

/// Resolve the client identity from headers and the connection address
pub(crate) fn client_identity(req: &Request<Body>) -> ClientIdentity {
    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    ClientIdentity::from_request(req.headers(), direct_ip)
}

// ============================================================================
// Rate Limiting
// ============================================================================

/// Strict limiter for credential endpoints
pub async fn rate_limit_login<R>(
    State(state): State<AuthAppState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthRepositories,
{
    rate_limit(&state, "login", RateLimitConfig::login(), req, next).await
}

/// Baseline limiter for everything under the API
pub async fn rate_limit_general<R>(
    State(state): State<AuthAppState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthRepositories,
{
    rate_limit(&state, "general_api", RateLimitConfig::general_api(), req, next).await
}

async fn rate_limit<R>(
    state: &AuthAppState<R>,
    category: &str,
    config: RateLimitConfig,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthRepositories,
{
    let client = client_identity(&req);
    let key = client.rate_limit_key(category);

    let result = state
        .rate_limiter
        .check_and_increment(&key, &config)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()).into_response())?;

    if !result.allowed {
        let mut response = AuthError::RateLimited {
            retry_after_secs: result.retry_after_secs,
        }
        .into_response();
        apply_rate_limit_headers(&mut response, &config, &result);
        return Err(response);
    }

    let mut response = next.run(req).await;
    apply_rate_limit_headers(&mut response, &config, &result);
    Ok(response)
}

fn apply_rate_limit_headers(
    response: &mut Response,
    config: &RateLimitConfig,
    result: &RateLimitResult,
) {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&config.max_requests.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.reset_at_ms.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }
}

// ============================================================================
// Request Body Scanning
// ============================================================================

/// Scan mutating request bodies for injection patterns.
///
/// High-risk findings (SQL or command injection shapes) reject the
/// request outright; lower-risk findings are logged and passed through,
/// since output encoding handles them at render time.
pub async fn scan_request_body<R>(
    State(_state): State<AuthAppState<R>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthRepositories,
{
    if !matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return Ok(next.run(req).await);
    }

    let client = client_identity(&req);
    let (parts, body) = req.into_parts();

    let bytes = to_bytes(body, MAX_SCAN_BYTES).await.map_err(|_| {
        AuthError::ValidationRejected("Request body too large".to_string()).into_response()
    })?;

    if !bytes.is_empty() {
        let text = String::from_utf8_lossy(&bytes);
        let report = detect(&text);

        if report.risk_level >= RiskLevel::High {
            tracing::warn!(
                target: "security",
                ip = %client.ip_string(),
                path = %parts.uri.path(),
                categories = ?report.categories,
                "High-risk request body rejected"
            );
            return Err(AuthError::ValidationRejected(
                "Request contains disallowed content".to_string(),
            )
            .into_response());
        }

        if report.is_malicious() {
            tracing::warn!(
                target: "security",
                ip = %client.ip_string(),
                path = %parts.uri.path(),
                categories = ?report.categories,
                "Suspicious request body detected"
            );
        }
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

// ============================================================================
// Authentication
// ============================================================================

/// Require a valid bearer access token; attaches [`AuthUser`] for
/// downstream handlers.
///
/// Admin roles are refused here unless their login included a verified
/// second factor, so elevated tokens without 2FA never reach a handler.
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthRepositories,
{
    let token = bearer_token(&req).ok_or_else(|| AuthError::SessionInvalid.into_response())?;

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.config.clone());
    let auth_user = use_case
        .execute(&token)
        .await
        .map_err(IntoResponse::into_response)?;

    if auth_user.is_admin() && !auth_user.second_factor_verified {
        return Err(AuthError::Forbidden(
            "Administrative access requires a verified second factor".to_string(),
        )
        .into_response());
    }

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

// ============================================================================
// Authorization
// ============================================================================

/// Permission guard used by handlers after authentication
pub fn authorize(
    user: &AuthUser,
    resource: Resource,
    action: Action,
    target: &AccessTarget,
) -> AuthResult<()> {
    check(&user.subject(), resource, action, target)
        .map_err(|denial| AuthError::Forbidden(denial.to_string()))
}

// ============================================================================
// Security Headers
// ============================================================================

/// Baseline security headers on every response
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // Token and session responses must never land in shared caches
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

//! Auth Router
//!
//! Assembles the endpoint tree with its security layers. Layer order,
//! outermost first: security headers, general rate limit, body scan,
//! then per-group layers (the strict login limiter on credential
//! endpoints, token authentication on protected ones).

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState, AuthRepositories};
use crate::presentation::middleware as security;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_with_state(AuthAppState::new(repo, config))
}

/// Create the Auth router for any repository implementation
pub fn auth_router_with_state<R>(state: AuthAppState<R>) -> Router
where
    R: AuthRepositories,
{
    let credential_routes = Router::new()
        .route("/register", post(handlers::register::<R>))
        .route("/login", post(handlers::login::<R>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::rate_limit_login::<R>,
        ));

    let refresh_routes = Router::new().route("/refresh", post(handlers::refresh::<R>));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout::<R>))
        .route("/me", get(handlers::me))
        .route("/sessions", get(handlers::list_sessions::<R>))
        .route(
            "/sessions/revoke_all",
            post(handlers::revoke_all_sessions::<R>),
        )
        .route("/totp/setup", post(handlers::totp_setup::<R>))
        .route("/totp/confirm", post(handlers::totp_confirm::<R>))
        .route("/totp/verify", post(handlers::totp_verify::<R>))
        .route("/totp/disable", post(handlers::totp_disable::<R>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::require_auth::<R>,
        ));

    Router::new()
        .merge(credential_routes)
        .merge(refresh_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::scan_request_body::<R>,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::rate_limit_general::<R>,
        ))
        .layer(middleware::from_fn(security::security_headers))
        .with_state(state)
}

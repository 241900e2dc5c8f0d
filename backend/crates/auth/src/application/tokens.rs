//! Token Pair Issuance
//!
//! Shared by sign-in and refresh: both end in a freshly signed
//! access/refresh pair bound to the same session.

use kernel::id::SessionId;
use platform::crypto::{sha256, to_base64_url};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::token::{TokenClaims, TokenSigner};
use crate::domain::value_object::token_kind::TokenKind;
use crate::error::AuthResult;

/// A freshly issued access/refresh token pair
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign an access/refresh pair for a user and session.
///
/// Both tokens share one clock reading so `iat` matches across the pair.
pub(crate) fn issue_token_pair(
    signer: &TokenSigner,
    config: &AuthConfig,
    user: &User,
    session_id: SessionId,
    second_factor_verified: bool,
) -> AuthResult<TokenPair> {
    let now_ms = chrono::Utc::now().timestamp_millis();

    let access_claims = TokenClaims::for_user(
        user,
        session_id,
        TokenKind::Access,
        second_factor_verified,
        now_ms,
        config.access_ttl_ms(),
    );
    let refresh_claims = TokenClaims::for_user(
        user,
        session_id,
        TokenKind::Refresh,
        second_factor_verified,
        now_ms,
        config.refresh_ttl_ms(),
    );

    Ok(TokenPair {
        access_token: signer.sign(&access_claims)?,
        refresh_token: signer.sign(&refresh_claims)?,
    })
}

/// Hash a refresh token for session storage and comparison.
///
/// The session row stores only this digest, so a database leak does not
/// expose usable refresh tokens.
pub(crate) fn refresh_token_hash(token: &str) -> String {
    to_base64_url(&sha256(token.as_bytes()))
}

//! Token Service
//!
//! Stateless signed tokens: `base64url(claims JSON) . base64url(HMAC-SHA256)`.
//! The signature covers the raw encoded payload and is checked in
//! constant time before the claims are even parsed. Verification fails
//! closed on any structural, signature, time, or kind mismatch.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use access::{RegionId, RegionScope, Role};
use kernel::id::{SessionId, UserId};
use platform::crypto::constant_time_eq;

use crate::domain::entity::auth_user::AuthUser;
use crate::domain::entity::user::User;
use crate::domain::value_object::token_kind::TokenKind;

/// Why token verification failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token is not yet valid")]
    NotYetValid,
    #[error("Token kind does not match")]
    KindMismatch,
}

/// The payload carried inside a signed token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: internal user id
    pub sub: UserId,
    /// Public id, for API responses without a lookup
    pub pid: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Home region id
    pub hreg: i32,
    /// Accessible region ids; `None` means unrestricted
    pub regions: Option<Vec<i32>>,
    /// Session this token is bound to
    pub sid: SessionId,
    /// Token kind (`access` | `refresh`)
    pub kind: TokenKind,
    /// Second-factor-verified flag
    pub sfv: bool,
    /// Issued-at (Unix ms)
    pub iat: i64,
    /// Not-before (Unix ms)
    pub nbf: i64,
    /// Expiry (Unix ms)
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a user and session.
    ///
    /// Invariant: `exp > iat >= nbf` for any positive TTL.
    pub fn for_user(
        user: &User,
        session_id: SessionId,
        kind: TokenKind,
        second_factor_verified: bool,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Self {
        let regions = user
            .regions
            .region_ids()
            .map(|ids| ids.iter().map(|r| r.0).collect());

        Self {
            sub: user.user_id,
            pid: user.public_id.to_string(),
            email: user.email.as_str().to_string(),
            name: user.display_name.as_str().to_string(),
            role: user.role,
            hreg: user.home_region.0,
            regions,
            sid: session_id,
            kind,
            sfv: second_factor_verified,
            iat: now_ms,
            nbf: now_ms,
            exp: now_ms + ttl_ms,
        }
    }

    /// Rebuild the resolved identity from verified claims
    pub fn to_auth_user(&self) -> AuthUser {
        let regions = match &self.regions {
            None => RegionScope::All,
            Some(ids) => RegionScope::Regions(ids.iter().map(|&r| RegionId(r)).collect()),
        };

        AuthUser {
            user_id: self.sub,
            public_id: self.pid.clone(),
            email: self.email.clone(),
            display_name: self.name.clone(),
            role: self.role,
            home_region: RegionId(self.hreg),
            regions,
            session_id: self.sid,
            second_factor_verified: self.sfv,
        }
    }
}

/// Signs and verifies tokens with a single HMAC key
#[derive(Clone)]
pub struct TokenSigner {
    secret: [u8; 32],
}

impl TokenSigner {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    fn mac(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Sign claims into the wire format
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let json = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(&json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes()));
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token against the expected kind and clock reading.
    ///
    /// Order: structure, signature (constant time), claims parse,
    /// not-before, expiry, kind.
    pub fn verify(
        &self,
        token: &str,
        expected_kind: TokenKind,
        now_ms: i64,
    ) -> Result<TokenClaims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let presented = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let expected = self.mac(payload.as_bytes());
        if !constant_time_eq(&presented, &expected) {
            return Err(TokenError::InvalidSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if now_ms < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now_ms >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.kind != expected_kind {
            return Err(TokenError::KindMismatch);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{display_name::DisplayName, email::Email};

    fn test_user() -> User {
        User::new(
            Email::new("hanako@example.com").unwrap(),
            DisplayName::new("Hanako").unwrap(),
            RegionId(1),
        )
    }

    fn signer() -> TokenSigner {
        TokenSigner::new([7u8; 32])
    }

    #[test]
    fn test_round_trip() {
        let user = test_user();
        let sid = SessionId::new();
        let now = 1_700_000_000_000;
        let claims = TokenClaims::for_user(&user, sid, TokenKind::Access, false, now, 900_000);

        let token = signer().sign(&claims).unwrap();
        let verified = signer().verify(&token, TokenKind::Access, now + 1).unwrap();

        assert_eq!(verified.sub, user.user_id);
        assert_eq!(verified.sid, sid);
        assert_eq!(verified.email, "hanako@example.com");
        assert_eq!(verified.role, Role::Student);
        assert_eq!(verified.regions, Some(vec![1]));
        assert!(verified.exp > verified.iat);
        assert!(verified.iat >= verified.nbf);
    }

    #[test]
    fn test_kind_mismatch_fails_closed() {
        let user = test_user();
        let now = 1_700_000_000_000;
        let claims =
            TokenClaims::for_user(&user, SessionId::new(), TokenKind::Access, false, now, 900_000);
        let token = signer().sign(&claims).unwrap();

        assert_eq!(
            signer().verify(&token, TokenKind::Refresh, now + 1),
            Err(TokenError::KindMismatch)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let user = test_user();
        let now = 1_700_000_000_000;
        let claims =
            TokenClaims::for_user(&user, SessionId::new(), TokenKind::Access, false, now, 1000);
        let token = signer().sign(&claims).unwrap();
        let s = signer();

        // One ms before expiry: valid. At expiry: rejected.
        assert!(s.verify(&token, TokenKind::Access, now + 999).is_ok());
        assert_eq!(
            s.verify(&token, TokenKind::Access, now + 1000),
            Err(TokenError::Expired)
        );
        assert_eq!(
            s.verify(&token, TokenKind::Access, now - 1),
            Err(TokenError::NotYetValid)
        );
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let user = test_user();
        let now = 1_700_000_000_000;
        let claims =
            TokenClaims::for_user(&user, SessionId::new(), TokenKind::Access, false, now, 900_000);
        let token = signer().sign(&claims).unwrap();

        // Flip a payload character
        let mut chars: Vec<char> = token.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(
            signer().verify(&tampered, TokenKind::Access, now + 1),
            Err(TokenError::InvalidSignature) | Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let user = test_user();
        let now = 1_700_000_000_000;
        let claims =
            TokenClaims::for_user(&user, SessionId::new(), TokenKind::Access, false, now, 900_000);
        let token = signer().sign(&claims).unwrap();

        let other = TokenSigner::new([8u8; 32]);
        assert_eq!(
            other.verify(&token, TokenKind::Access, now + 1),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let s = signer();
        assert_eq!(
            s.verify("not-a-token", TokenKind::Access, 0),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            s.verify("a.b.c", TokenKind::Access, 0),
            Err(TokenError::Malformed)
        );
        assert_eq!(s.verify("", TokenKind::Access, 0), Err(TokenError::Malformed));
    }

    #[test]
    fn test_admin_scope_serializes_as_unrestricted() {
        let mut user = test_user();
        user.set_role(Role::Owner);
        let now = 1_700_000_000_000;
        let claims =
            TokenClaims::for_user(&user, SessionId::new(), TokenKind::Access, true, now, 900_000);
        assert_eq!(claims.regions, None);

        let auth_user = claims.to_auth_user();
        assert!(auth_user.regions.is_all());
        assert!(auth_user.second_factor_verified);
    }
}

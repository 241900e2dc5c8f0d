//! Session Entity
//!
//! Server-side record per login, independent of token content. Tokens
//! reference the session id; revoking the row invalidates every token
//! bound to it regardless of their own expiry.

use chrono::{DateTime, Duration, Utc};

use kernel::id::{SessionId, UserId};

/// Auth session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (UUID v4), carried in token claims
    pub session_id: SessionId,
    /// Reference to User
    pub user_id: UserId,
    /// Hash of the current refresh token; never the token itself.
    /// A presented refresh token that verifies but does not match this
    /// hash indicates replay of a rotated-out token.
    pub refresh_hash: String,
    /// Device label for the session management screen
    pub device_info: String,
    /// Client IP at login (for display and audit)
    pub ip: Option<String>,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Server-side revocation flag
    pub revoked: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp, bumped on each valid lookup
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session.
    ///
    /// TTL comes from the application layer config, not hard-coded here.
    pub fn new(
        user_id: UserId,
        refresh_hash: String,
        device_info: String,
        ip: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            user_id,
            refresh_hash,
            device_info,
            ip,
            expires_at_ms: (now + ttl).timestamp_millis(),
            revoked: false,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Check if session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Usable: neither revoked nor expired
    pub fn is_valid(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Mark revoked (idempotent)
    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    /// Install a new refresh hash and extend expiry (rotation)
    pub fn rotate_refresh(&mut self, new_hash: &str, expires_at_ms: i64) {
        self.refresh_hash = new_hash.to_string();
        self.expires_at_ms = expires_at_ms;
        self.touch();
    }
}

/// Session info for API responses (non-sensitive)
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub device_info: String,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub is_current: bool,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id,
            device_info: session.device_info.clone(),
            ip: session.ip.clone(),
            created_at: session.created_at,
            last_activity_at: session.last_activity_at,
            is_current: false, // Set by caller
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            UserId::new(),
            "hash".to_string(),
            "Mozilla/5.0".to_string(),
            Some("203.0.113.9".to_string()),
            Duration::days(7),
        )
    }

    #[test]
    fn test_new_session_is_valid() {
        let s = session();
        assert!(s.is_valid());
        assert!(!s.is_expired());
        assert!(!s.revoked);
    }

    #[test]
    fn test_revocation_invalidates() {
        let mut s = session();
        s.revoke();
        assert!(!s.is_valid());
        // Idempotent
        s.revoke();
        assert!(s.revoked);
    }

    #[test]
    fn test_expired_session_is_invalid() {
        let mut s = session();
        s.expires_at_ms = Utc::now().timestamp_millis() - 1000;
        assert!(s.is_expired());
        assert!(!s.is_valid());
    }

    #[test]
    fn test_rotation_replaces_hash_and_extends() {
        let mut s = session();
        let new_expiry = s.expires_at_ms + Duration::days(7).num_milliseconds();
        s.rotate_refresh("new-hash", new_expiry);
        assert_eq!(s.refresh_hash, "new-hash");
        assert_eq!(s.expires_at_ms, new_expiry);
    }
}

//! Authenticated User
//!
//! The identity resolved from a verified access token. This is what the
//! middleware hands to downstream handlers and what the permission
//! engine decides against. It is rebuilt from token claims on every
//! request without a database round trip.

use access::{RegionId, RegionScope, Role, Subject};
use kernel::id::{SessionId, UserId};

/// Resolved identity attached to authenticated requests
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub public_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub home_region: RegionId,
    pub regions: RegionScope,
    /// Session the presented token is bound to
    pub session_id: SessionId,
    /// Whether the second factor was verified during this login
    pub second_factor_verified: bool,
}

impl AuthUser {
    /// The permission-engine view of this identity
    pub fn subject(&self) -> Subject {
        Subject {
            user_id: self.user_id,
            role: self.role,
            home_region: self.home_region,
            regions: self.regions.clone(),
        }
    }

    /// Convenience check used by admin-only endpoints
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check membership against an allowed role list
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

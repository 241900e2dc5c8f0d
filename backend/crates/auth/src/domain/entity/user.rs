//! User Entity
//!
//! Core identity entity. Sensitive credential material lives in the
//! Credential and TotpEnrollment entities.

use chrono::{DateTime, Utc};

use access::{RegionId, RegionScope, Role, Subject};
use kernel::id::UserId;

use crate::domain::value_object::{
    display_name::DisplayName, email::Email, public_id::PublicId, user_status::UserStatus,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// Login identifier (unique)
    pub email: Email,
    /// Name shown on portal screens
    pub display_name: DisplayName,
    /// Portal role
    pub role: Role,
    /// Home region
    pub home_region: RegionId,
    /// Regions this user may operate in
    pub regions: RegionScope,
    /// Account status
    pub status: UserStatus,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new student user in a single region
    pub fn new(email: Email, display_name: DisplayName, home_region: RegionId) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            email,
            display_name,
            role: Role::default(),
            home_region,
            regions: RegionScope::single(home_region),
            status: UserStatus::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Check if user can login
    pub fn can_login(&self) -> bool {
        self.status.can_login()
    }

    /// Whether this account must have TOTP enrolled before elevated
    /// permissions apply
    pub fn requires_second_factor(&self) -> bool {
        self.role.requires_second_factor()
    }

    /// Update role; admin roles get an unrestricted region scope
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        if role.is_admin() {
            self.regions = RegionScope::All;
        }
        self.updated_at = Utc::now();
    }

    /// The permission-engine view of this user
    pub fn subject(&self) -> Subject {
        Subject {
            user_id: self.user_id,
            role: self.role,
            home_region: self.home_region,
            regions: self.regions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Email::new("hanako@example.com").unwrap(),
            DisplayName::new("橋本 花子").unwrap(),
            RegionId(1),
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let u = user();
        assert_eq!(u.role, Role::Student);
        assert_eq!(u.status, UserStatus::Active);
        assert!(u.regions.contains(RegionId(1)));
        assert!(!u.regions.contains(RegionId(2)));
        assert!(u.can_login());
        assert!(!u.requires_second_factor());
    }

    #[test]
    fn test_admin_promotion_widens_scope() {
        let mut u = user();
        u.set_role(Role::Secretariat);
        assert!(u.regions.is_all());
        assert!(u.requires_second_factor());
    }

    #[test]
    fn test_subject_reflects_user() {
        let u = user();
        let s = u.subject();
        assert_eq!(s.user_id, u.user_id);
        assert_eq!(s.role, u.role);
        assert_eq!(s.home_region, u.home_region);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum Role {
    #[default]
    Student = 0,
    CompanyAdmin = 1,
    Secretariat = 2,
    Owner = 3,
}

impl Role {
    /// All roles, for totality checks over the matrix
    pub const ALL: [Role; 4] = [
        Role::Student,
        Role::CompanyAdmin,
        Role::Secretariat,
        Role::Owner,
    ];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            Student => "student",
            CompanyAdmin => "company_admin",
            Secretariat => "secretariat",
            Owner => "owner",
        }
    }

    /// Company-level or above: may see member data within their scope
    #[inline]
    pub const fn is_company_level_or_higher(&self) -> bool {
        use Role::*;
        matches!(self, CompanyAdmin | Secretariat | Owner)
    }

    /// Portal administration: secretariat staff and the owner
    #[inline]
    pub const fn is_admin(&self) -> bool {
        use Role::*;
        matches!(self, Secretariat | Owner)
    }

    #[inline]
    pub const fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    /// Roles that must complete second-factor enrollment before
    /// their elevated permissions apply
    #[inline]
    pub const fn requires_second_factor(&self) -> bool {
        self.is_admin()
    }

    #[inline]
    pub fn from_id(id: i16) -> Self {
        use Role::*;
        match id {
            0 => Student,
            1 => CompanyAdmin,
            2 => Secretariat,
            3 => Owner,
            _ => {
                tracing::error!("Invalid Role id: {}", id);
                unreachable!("Invalid Role id: {}", id)
            }
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "student" => Some(Student),
            "company_admin" => Some(CompanyAdmin),
            "secretariat" => Some(Secretariat),
            "owner" => Some(Owner),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_id() {
        for role in Role::ALL {
            assert_eq!(Role::from_id(role.id()), role);
        }
    }

    #[test]
    fn test_role_from_code() {
        assert_eq!(Role::from_code("student"), Some(Role::Student));
        assert_eq!(Role::from_code("company_admin"), Some(Role::CompanyAdmin));
        assert_eq!(Role::from_code("secretariat"), Some(Role::Secretariat));
        assert_eq!(Role::from_code("owner"), Some(Role::Owner));
        assert_eq!(Role::from_code("admin"), None);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Student < Role::CompanyAdmin);
        assert!(Role::CompanyAdmin < Role::Secretariat);
        assert!(Role::Secretariat < Role::Owner);
    }

    #[test]
    fn test_role_checks() {
        assert!(!Role::Student.is_company_level_or_higher());
        assert!(Role::CompanyAdmin.is_company_level_or_higher());
        assert!(!Role::CompanyAdmin.is_admin());
        assert!(Role::Secretariat.is_admin());
        assert!(Role::Owner.is_admin());
        assert!(!Role::Secretariat.is_owner());
        assert!(Role::Owner.is_owner());
    }

    #[test]
    fn test_second_factor_requirement() {
        assert!(!Role::Student.requires_second_factor());
        assert!(!Role::CompanyAdmin.requires_second_factor());
        assert!(Role::Secretariat.requires_second_factor());
        assert!(Role::Owner.requires_second_factor());
    }
}

//! The permission decision function.
//!
//! `check` is total: any (subject, resource, action, target)
//! combination yields allow or a concrete denial reason, never a panic.

use std::fmt;

use kernel::id::UserId;

use crate::matrix::rule_for;
use crate::region::{RegionId, RegionScope};
use crate::resource::{Action, Resource};
use crate::role::Role;

/// The authenticated identity a decision is made for
#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: UserId,
    pub role: Role,
    pub home_region: RegionId,
    pub regions: RegionScope,
}

impl Subject {
    pub fn can_access_region(&self, region: RegionId) -> bool {
        self.regions.contains(region)
    }
}

/// Attributes of the row being acted on, when known.
///
/// Collection-level operations (create, list) usually have no concrete
/// target; both fields default to unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessTarget {
    pub owner_id: Option<UserId>,
    pub region: Option<RegionId>,
}

impl AccessTarget {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            region: None,
        }
    }

    pub fn in_region(mut self, region: RegionId) -> Self {
        self.region = Some(region);
        self
    }
}

/// Why a decision denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The matrix grants this action to no role, or not to this one
    ActionNotGranted,
    /// Role grant exists but the target's region is outside the
    /// subject's scope
    RegionDenied,
    /// Role grant exists but the rule requires owning the target
    OwnershipRequired,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::ActionNotGranted => "action not granted to role",
            DenyReason::RegionDenied => "target region outside subject scope",
            DenyReason::OwnershipRequired => "target not owned by subject",
        };
        f.write_str(s)
    }
}

/// Permission decision with denial reason.
///
/// Order of evaluation:
/// 1. look up the resource rule (absence fails closed)
/// 2. matrix path: is the role in the action's allowed set
/// 3. region predicate, when the rule is region restricted and the
///    target's region is known
/// 4. ownership predicate, when the rule requires it for non-admins
/// 5. ownership override: read/update on a row the subject owns is
///    allowed even without a matrix grant
pub fn check(
    subject: &Subject,
    resource: Resource,
    action: Action,
    target: &AccessTarget,
) -> Result<(), DenyReason> {
    let owns_target = target.owner_id.is_some_and(|owner| owner == subject.user_id);

    let denial = match rule_for(resource) {
        Some(rule) => {
            let role_granted = crate::matrix::roles_for(resource, action).contains(&subject.role);
            if role_granted {
                let region_ok = !rule.region_restricted
                    || target
                        .region
                        .is_none_or(|region| subject.can_access_region(region));
                let ownership_ok = !rule.ownership_required
                    || subject.role.is_admin()
                    || target.owner_id.is_none()
                    || owns_target;

                if !region_ok {
                    DenyReason::RegionDenied
                } else if !ownership_ok {
                    DenyReason::OwnershipRequired
                } else {
                    return Ok(());
                }
            } else {
                DenyReason::ActionNotGranted
            }
        }
        None => DenyReason::ActionNotGranted,
    };

    // Ownership override: owning the row grants read/update regardless
    // of the matrix outcome
    if action.allows_ownership_override() && owns_target {
        return Ok(());
    }

    Err(denial)
}

/// Boolean form of [`check`]
pub fn can(subject: &Subject, resource: Resource, action: Action, target: &AccessTarget) -> bool {
    check(subject, resource, action, target).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::roles_for;

    fn subject(role: Role, regions: RegionScope) -> Subject {
        Subject {
            user_id: UserId::new(),
            role,
            home_region: RegionId(1),
            regions,
        }
    }

    #[test]
    fn test_decision_is_total_and_matches_matrix() {
        // Without a target the decision must equal the published
        // matrix for every triple
        for role in Role::ALL {
            let s = subject(role, RegionScope::All);
            for resource in Resource::ALL {
                for action in Action::ALL {
                    let expected = roles_for(resource, action).contains(&role);
                    assert_eq!(
                        can(&s, resource, action, &AccessTarget::none()),
                        expected,
                        "{role} {resource} {action}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_ownership_override_grants_read_update_only() {
        let s = subject(Role::Student, RegionScope::single(RegionId(1)));
        let own = AccessTarget::owned_by(s.user_id);
        let other = AccessTarget::owned_by(UserId::new());

        // No matrix grant for student on user update, but they own it
        assert!(can(&s, Resource::User, Action::Update, &own));
        assert!(can(&s, Resource::User, Action::Read, &own));
        assert!(!can(&s, Resource::User, Action::Update, &other));

        // The override never extends to delete
        assert_eq!(
            check(&s, Resource::User, Action::Delete, &own),
            Err(DenyReason::ActionNotGranted)
        );
    }

    #[test]
    fn test_own_attendance_is_visible() {
        let s = subject(Role::Student, RegionScope::single(RegionId(1)));
        let own = AccessTarget::owned_by(s.user_id).in_region(RegionId(1));
        let other = AccessTarget::owned_by(UserId::new()).in_region(RegionId(1));

        assert!(can(&s, Resource::Attendance, Action::Read, &own));
        assert!(!can(&s, Resource::Attendance, Action::Read, &other));
    }

    #[test]
    fn test_region_scoping() {
        let s = subject(Role::CompanyAdmin, RegionScope::single(RegionId(1)));
        let in_scope = AccessTarget::none().in_region(RegionId(1));
        let out_of_scope = AccessTarget::none().in_region(RegionId(2));

        assert!(can(&s, Resource::Member, Action::Read, &in_scope));
        assert_eq!(
            check(&s, Resource::Member, Action::Read, &out_of_scope),
            Err(DenyReason::RegionDenied)
        );

        // Unrestricted scope passes everywhere
        let admin = subject(Role::Secretariat, RegionScope::All);
        assert!(can(&admin, Resource::Member, Action::Read, &out_of_scope));
    }

    #[test]
    fn test_unknown_region_is_not_restricted() {
        // Collection-level checks carry no region; the matrix grant
        // stands and row filtering happens at the query layer
        let s = subject(Role::CompanyAdmin, RegionScope::single(RegionId(1)));
        assert!(can(&s, Resource::Member, Action::Read, &AccessTarget::none()));
    }

    #[test]
    fn test_ownership_required_rule() {
        // Session reads are owner-role only across users; a student
        // still reaches their own session row via the override
        let s = subject(Role::Student, RegionScope::single(RegionId(1)));
        assert!(can(
            &s,
            Resource::Session,
            Action::Read,
            &AccessTarget::owned_by(s.user_id)
        ));
        assert!(!can(
            &s,
            Resource::Session,
            Action::Read,
            &AccessTarget::owned_by(UserId::new())
        ));

        // The owner role is admin and exempt from the ownership clause
        let owner = subject(Role::Owner, RegionScope::All);
        assert!(can(
            &owner,
            Resource::Session,
            Action::Delete,
            &AccessTarget::owned_by(UserId::new())
        ));
    }

    #[test]
    fn test_region_denial_does_not_strip_ownership() {
        // A student's own row homed in another region stays readable
        let s = subject(Role::Student, RegionScope::single(RegionId(1)));
        let own_elsewhere = AccessTarget::owned_by(s.user_id).in_region(RegionId(2));
        assert!(can(&s, Resource::Attendance, Action::Read, &own_elsewhere));
    }
}

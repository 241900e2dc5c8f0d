//! The published permission matrix.
//!
//! One rule per resource. An action absent from a rule's `actions`
//! list is denied via the matrix path for every role; the ownership
//! override in the engine may still grant read/update on owned rows.

use crate::resource::{Action, Resource};
use crate::role::Role;

use Action::*;
use Role::*;

/// One row of the matrix
#[derive(Debug)]
pub struct PermissionRule {
    pub resource: Resource,
    /// Action -> roles allowed via the matrix path
    pub actions: &'static [(Action, &'static [Role])],
    /// Whether grants are scoped to the subject's accessible regions
    pub region_restricted: bool,
    /// Whether non-admin grants additionally require owning the target
    pub ownership_required: bool,
}

const EVERYONE: &[Role] = &[Student, CompanyAdmin, Secretariat, Owner];
const COMPANY_LEVEL: &[Role] = &[CompanyAdmin, Secretariat, Owner];
const ADMINS: &[Role] = &[Secretariat, Owner];
const OWNER_ONLY: &[Role] = &[Owner];

pub static PERMISSION_MATRIX: &[PermissionRule] = &[
    PermissionRule {
        resource: Resource::User,
        actions: &[
            (Create, ADMINS),
            (Read, COMPANY_LEVEL),
            (Update, ADMINS),
            (Delete, OWNER_ONLY),
            (Invite, ADMINS),
            (Manage, OWNER_ONLY),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Company,
        actions: &[
            (Create, OWNER_ONLY),
            (Read, EVERYONE),
            (Update, COMPANY_LEVEL),
            (Delete, OWNER_ONLY),
            (Manage, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Member,
        actions: &[
            (Create, COMPANY_LEVEL),
            (Read, COMPANY_LEVEL),
            (Update, COMPANY_LEVEL),
            (Delete, COMPANY_LEVEL),
            (Invite, COMPANY_LEVEL),
            (Approve, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Announcement,
        actions: &[
            (Create, ADMINS),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, ADMINS),
            (Publish, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Class,
        actions: &[
            (Create, ADMINS),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, ADMINS),
            (Publish, ADMINS),
            (Attend, EVERYONE),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Project,
        actions: &[
            (Create, ADMINS),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, ADMINS),
            (Publish, ADMINS),
            (Manage, ADMINS),
            (Attend, EVERYONE),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Committee,
        actions: &[
            (Create, ADMINS),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, OWNER_ONLY),
            (Manage, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Event,
        actions: &[
            (Create, ADMINS),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, ADMINS),
            (Publish, ADMINS),
            (Attend, EVERYONE),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    // Students record their own attendance; company admins approve
    // within their scope. Reads of other people's records stay at
    // company level and above.
    PermissionRule {
        resource: Resource::Attendance,
        actions: &[
            (Create, EVERYONE),
            (Read, COMPANY_LEVEL),
            (Update, ADMINS),
            (Delete, ADMINS),
            (Approve, COMPANY_LEVEL),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Audit,
        actions: &[(Read, OWNER_ONLY), (Manage, OWNER_ONLY)],
        region_restricted: false,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::File,
        actions: &[
            (Create, EVERYONE),
            (Read, EVERYONE),
            (Update, ADMINS),
            (Delete, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    PermissionRule {
        resource: Resource::Invitation,
        actions: &[
            (Create, COMPANY_LEVEL),
            (Read, COMPANY_LEVEL),
            (Delete, COMPANY_LEVEL),
            (Approve, ADMINS),
        ],
        region_restricted: true,
        ownership_required: false,
    },
    // Session rows: cross-user administration is owner-only; users
    // reach their own sessions through the ownership override and the
    // dedicated lifecycle endpoints.
    PermissionRule {
        resource: Resource::Session,
        actions: &[(Read, OWNER_ONLY), (Delete, OWNER_ONLY), (Manage, OWNER_ONLY)],
        region_restricted: false,
        ownership_required: true,
    },
];

/// Look up the rule for a resource
pub fn rule_for(resource: Resource) -> Option<&'static PermissionRule> {
    PERMISSION_MATRIX.iter().find(|r| r.resource == resource)
}

/// Roles allowed via the matrix path for (resource, action)
pub fn roles_for(resource: Resource, action: Action) -> &'static [Role] {
    rule_for(resource)
        .and_then(|rule| {
            rule.actions
                .iter()
                .find(|(a, _)| *a == action)
                .map(|(_, roles)| *roles)
        })
        .unwrap_or(&[])
}

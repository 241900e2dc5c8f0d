use serde::{Deserialize, Serialize};
use std::fmt;

/// Protected resource types; closed enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    Company,
    Member,
    Announcement,
    Class,
    Project,
    Committee,
    Event,
    Attendance,
    Audit,
    File,
    Invitation,
    Session,
}

impl Resource {
    pub const ALL: [Resource; 13] = [
        Resource::User,
        Resource::Company,
        Resource::Member,
        Resource::Announcement,
        Resource::Class,
        Resource::Project,
        Resource::Committee,
        Resource::Event,
        Resource::Attendance,
        Resource::Audit,
        Resource::File,
        Resource::Invitation,
        Resource::Session,
    ];

    pub const fn as_str(&self) -> &'static str {
        use Resource::*;
        match self {
            User => "user",
            Company => "company",
            Member => "member",
            Announcement => "announcement",
            Class => "class",
            Project => "project",
            Committee => "committee",
            Event => "event",
            Attendance => "attendance",
            Audit => "audit",
            File => "file",
            Invitation => "invitation",
            Session => "session",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions a role may be granted on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Publish,
    Invite,
    Manage,
    Approve,
    Attend,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Publish,
        Action::Invite,
        Action::Manage,
        Action::Approve,
        Action::Attend,
    ];

    pub const fn as_str(&self) -> &'static str {
        use Action::*;
        match self {
            Create => "create",
            Read => "read",
            Update => "update",
            Delete => "delete",
            Publish => "publish",
            Invite => "invite",
            Manage => "manage",
            Approve => "approve",
            Attend => "attend",
        }
    }

    /// The two actions the ownership override can grant without a
    /// matrix entry
    pub const fn allows_ownership_override(&self) -> bool {
        matches!(self, Action::Read | Action::Update)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamRole {
    Owner,
    Admin,
    Member,
}

wire_enum!(TeamRole, "team role", {
    Owner => "owner",
    Admin => "admin",
    Member => "member",
});

impl TeamRole {
    /// Owners and admins review applications and send invites.
    pub fn can_manage(&self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Admin)
    }
}

/// Who started a join request: the user (application) or the team (invite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationKind {
    Application,
    Invite,
}

wire_enum!(ApplicationKind, "application kind", {
    Application => "application",
    Invite => "invite",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

wire_enum!(ApplicationStatus, "application status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_and_admin_manage() {
        assert!(TeamRole::Owner.can_manage());
        assert!(TeamRole::Admin.can_manage());
        assert!(!TeamRole::Member.can_manage());
    }

    #[test]
    fn wire_names_cover_all_variants() {
        for role in TeamRole::ALL {
            assert_eq!(role.as_str().parse::<TeamRole>().unwrap(), *role);
        }
        for status in ApplicationStatus::ALL {
            assert_eq!(status.to_string().parse::<ApplicationStatus>().unwrap(), *status);
        }
        assert!("accepted".parse::<ApplicationStatus>().is_err());
    }
}

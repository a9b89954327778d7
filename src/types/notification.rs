use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Match,
    Message,
    TeamApplication,
    TeamInvite,
    ApplicationApproved,
    ApplicationRejected,
    Star,
}

wire_enum!(NotificationKind, "notification kind", {
    Match => "match",
    Message => "message",
    TeamApplication => "team_application",
    TeamInvite => "team_invite",
    ApplicationApproved => "application_approved",
    ApplicationRejected => "application_rejected",
    Star => "star",
});

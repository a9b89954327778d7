use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReputationAction {
    LinkGithub,
    LinkLinkedin,
    TeamCreated,
    JoinedTeam,
    Matched,
    StarReceived,
    MessageReceived,
}

wire_enum!(ReputationAction, "reputation action", {
    LinkGithub => "link_github",
    LinkLinkedin => "link_linkedin",
    TeamCreated => "team_created",
    JoinedTeam => "joined_team",
    Matched => "matched",
    StarReceived => "star_received",
    MessageReceived => "message_received",
});

impl ReputationAction {
    pub fn points(&self) -> i64 {
        match self {
            ReputationAction::LinkGithub => 20,
            ReputationAction::LinkLinkedin => 10,
            ReputationAction::TeamCreated => 5,
            ReputationAction::JoinedTeam => 10,
            ReputationAction::Matched => 5,
            ReputationAction::StarReceived => 3,
            ReputationAction::MessageReceived => 1,
        }
    }

    /// Account links pay out once per user and sit outside the daily cap.
    pub fn is_one_time(&self) -> bool {
        matches!(
            self,
            ReputationAction::LinkGithub | ReputationAction::LinkLinkedin
        )
    }
}

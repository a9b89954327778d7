use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{clamp_limit, notify, require_profile, validate, Campus, ServiceError, ServiceResult};
use crate::{
    storage::{
        models::{Profile, Team, TeamApplication, TeamMember, TeamQuery},
        Storage, StorageTx, TeamStore,
    },
    types::{ApplicationKind, ApplicationStatus, NotificationKind, ReputationAction, TeamRole},
};

const MAX_NAME: usize = 80;
const MAX_DESCRIPTION: usize = 1000;
const MAX_APPLICATION_MESSAGE: usize = 500;
const MIN_MEMBERS: u32 = 2;
const MAX_MEMBERS: u32 = 20;

#[derive(Clone, Debug, Default)]
pub struct NewTeam {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub max_members: u32,
    pub is_open: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub max_members: Option<u32>,
    pub is_open: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct TeamSummary {
    pub team: Team,
    pub member_count: u32,
}

#[derive(Clone, Debug)]
pub struct MemberView {
    pub member: TeamMember,
    pub profile: Profile,
}

#[derive(Clone, Debug)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<MemberView>,
}

fn max_members(value: u32) -> ServiceResult<u32> {
    if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&value) {
        return Err(ServiceError::invalid(format!(
            "maxMembers must be {MIN_MEMBERS}-{MAX_MEMBERS}"
        )));
    }
    Ok(value)
}

fn require_team<T: TeamStore + ?Sized>(tx: &T, id: Uuid) -> ServiceResult<Team> {
    tx.load_team(id)?.ok_or(ServiceError::NotFound("team"))
}

/// The actor's membership, provided it may manage the team.
fn require_manager<T: TeamStore + ?Sized>(
    tx: &T,
    team_id: Uuid,
    actor: Uuid,
) -> ServiceResult<TeamMember> {
    match tx.load_member(team_id, actor)? {
        Some(member) if member.role.can_manage() => Ok(member),
        _ => Err(ServiceError::forbidden("only the team owner or an admin may do this")),
    }
}

/// Rules shared by applications and invites: the team takes requests, has
/// room, and the user is neither a member nor already waiting on one.
fn check_joinable<T: TeamStore + ?Sized>(tx: &T, team: &Team, user: Uuid) -> ServiceResult<()> {
    if !team.is_open {
        return Err(ServiceError::invalid("team is not accepting members"));
    }
    if tx.count_members(team.id)? >= team.max_members {
        return Err(ServiceError::invalid("team is full"));
    }
    if tx.load_member(team.id, user)?.is_some() {
        return Err(ServiceError::conflict("user is already a team member"));
    }
    if tx.find_pending_application(team.id, user)?.is_some() {
        return Err(ServiceError::conflict(
            "a pending application or invite already exists",
        ));
    }
    Ok(())
}

impl<S: Storage> Campus<S> {
    pub fn create_team(&self, new: NewTeam, now: DateTime<Utc>) -> ServiceResult<Team> {
        let team = Team {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            name: validate::required_text("name", &new.name, MAX_NAME)?,
            description: validate::optional_text(
                "description",
                new.description.as_deref(),
                MAX_DESCRIPTION,
            )?,
            required_skills: validate::tag_list("requiredSkills", &new.required_skills)?,
            max_members: max_members(new.max_members)?,
            is_open: new.is_open.unwrap_or(true),
            created_at: now,
        };

        let tx = self.storage.begin_tx()?;
        require_profile(&tx, team.owner_id)?;
        tx.insert_team(&team)?;
        tx.insert_member(&TeamMember {
            team_id: team.id,
            user_id: team.owner_id,
            role: TeamRole::Owner,
            joined_at: now,
        })?;
        self.policy
            .grant(&tx, team.owner_id, ReputationAction::TeamCreated, now)?;
        tx.commit()?;

        log::info!("🛠️ team created: {} ({})", team.name, team.id);
        Ok(team)
    }

    pub fn list_teams(
        &self,
        open: Option<bool>,
        skill: Option<String>,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<TeamSummary>> {
        let query = TeamQuery {
            open,
            skill: skill.filter(|s| !s.trim().is_empty()),
            limit: clamp_limit(limit, 20, 100),
        };
        let tx = self.storage.begin_read()?;
        tx.list_teams(&query)?
            .into_iter()
            .map(|team| -> ServiceResult<TeamSummary> {
                let member_count = tx.count_members(team.id)?;
                Ok(TeamSummary { team, member_count })
            })
            .collect()
    }

    pub fn team_detail(&self, id: Uuid) -> ServiceResult<TeamDetail> {
        let tx = self.storage.begin_read()?;
        let team = require_team(&tx, id)?;
        let mut members = Vec::new();
        for member in tx.list_members(id)? {
            let profile = require_profile(&tx, member.user_id)?;
            members.push(MemberView { member, profile });
        }
        Ok(TeamDetail { team, members })
    }

    pub fn update_team(&self, id: Uuid, actor: Uuid, patch: TeamPatch) -> ServiceResult<Team> {
        let tx = self.storage.begin_tx()?;
        let mut team = require_team(&tx, id)?;
        require_manager(&tx, id, actor)?;

        if let Some(name) = patch.name {
            team.name = validate::required_text("name", &name, MAX_NAME)?;
        }
        if let Some(description) = patch.description {
            team.description =
                validate::optional_text("description", Some(description.as_str()), MAX_DESCRIPTION)?;
        }
        if let Some(skills) = patch.required_skills {
            team.required_skills = validate::tag_list("requiredSkills", &skills)?;
        }
        if let Some(max) = patch.max_members {
            let max = max_members(max)?;
            if max < tx.count_members(id)? {
                return Err(ServiceError::invalid(
                    "maxMembers cannot be below the current member count",
                ));
            }
            team.max_members = max;
        }
        if let Some(open) = patch.is_open {
            team.is_open = open;
        }

        tx.update_team(&team)?;
        tx.commit()?;
        Ok(team)
    }

    pub fn apply_to_team(
        &self,
        team_id: Uuid,
        user: Uuid,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> ServiceResult<TeamApplication> {
        let message =
            validate::optional_text("message", message.as_deref(), MAX_APPLICATION_MESSAGE)?;

        let tx = self.storage.begin_tx()?;
        let team = require_team(&tx, team_id)?;
        let applicant = require_profile(&tx, user)?;
        check_joinable(&tx, &team, user)?;

        let application = TeamApplication {
            id: Uuid::new_v4(),
            team_id,
            user_id: user,
            kind: ApplicationKind::Application,
            status: ApplicationStatus::Pending,
            message,
            invited_by: None,
            created_at: now,
            responded_at: None,
        };
        tx.insert_application(&application)?;
        notify(
            &tx,
            team.owner_id,
            NotificationKind::TeamApplication,
            Some(user),
            Some(application.id),
            format!("@{} applied to join {}", applicant.username, team.name),
            now,
        )?;
        tx.commit()?;
        Ok(application)
    }

    pub fn invite_to_team(
        &self,
        team_id: Uuid,
        actor: Uuid,
        user: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<TeamApplication> {
        let tx = self.storage.begin_tx()?;
        let team = require_team(&tx, team_id)?;
        require_manager(&tx, team_id, actor)?;
        require_profile(&tx, user)?;
        check_joinable(&tx, &team, user)?;

        let invite = TeamApplication {
            id: Uuid::new_v4(),
            team_id,
            user_id: user,
            kind: ApplicationKind::Invite,
            status: ApplicationStatus::Pending,
            message: None,
            invited_by: Some(actor),
            created_at: now,
            responded_at: None,
        };
        tx.insert_application(&invite)?;
        notify(
            &tx,
            user,
            NotificationKind::TeamInvite,
            Some(actor),
            Some(invite.id),
            format!("You were invited to join {}", team.name),
            now,
        )?;
        tx.commit()?;
        Ok(invite)
    }

    pub fn pending_applications(
        &self,
        team_id: Uuid,
        actor: Uuid,
    ) -> ServiceResult<Vec<TeamApplication>> {
        let tx = self.storage.begin_read()?;
        require_team(&tx, team_id)?;
        require_manager(&tx, team_id, actor)?;
        Ok(tx.list_pending_applications(team_id)?)
    }

    /// Approves or rejects a pending request. Applications are answered by
    /// the team's managers, invites by the invitee.
    pub fn respond_to_application(
        &self,
        application_id: Uuid,
        actor: Uuid,
        approve: bool,
        now: DateTime<Utc>,
    ) -> ServiceResult<TeamApplication> {
        let tx = self.storage.begin_tx()?;
        let mut application = tx
            .load_application(application_id)?
            .ok_or(ServiceError::NotFound("application"))?;
        let team = require_team(&tx, application.team_id)?;

        let notify_user = match application.kind {
            ApplicationKind::Application => {
                require_manager(&tx, team.id, actor)?;
                application.user_id
            }
            ApplicationKind::Invite => {
                if actor != application.user_id {
                    return Err(ServiceError::forbidden("only the invitee may respond"));
                }
                application.invited_by.unwrap_or(team.owner_id)
            }
        };
        if application.status != ApplicationStatus::Pending {
            return Err(ServiceError::conflict("application was already answered"));
        }

        let status = if approve {
            if tx.count_members(team.id)? >= team.max_members {
                return Err(ServiceError::invalid("team is full"));
            }
            tx.insert_member(&TeamMember {
                team_id: team.id,
                user_id: application.user_id,
                role: TeamRole::Member,
                joined_at: now,
            })?;
            self.policy
                .grant(&tx, application.user_id, ReputationAction::JoinedTeam, now)?;
            ApplicationStatus::Approved
        } else {
            ApplicationStatus::Rejected
        };
        tx.update_application_status(application.id, status, now)?;

        let (kind, verb) = match status {
            ApplicationStatus::Approved => (NotificationKind::ApplicationApproved, "approved"),
            _ => (NotificationKind::ApplicationRejected, "declined"),
        };
        let what = match application.kind {
            ApplicationKind::Application => "application",
            ApplicationKind::Invite => "invite",
        };
        notify(
            &tx,
            notify_user,
            kind,
            Some(actor),
            Some(team.id),
            format!("Your {what} for {} was {verb}", team.name),
            now,
        )?;
        tx.commit()?;

        application.status = status;
        application.responded_at = Some(now);
        log::info!("📨 {} {} {}", what, application.id, status);
        Ok(application)
    }

    pub fn leave_team(&self, team_id: Uuid, user: Uuid) -> ServiceResult<()> {
        let tx = self.storage.begin_tx()?;
        require_team(&tx, team_id)?;
        let member = tx
            .load_member(team_id, user)?
            .ok_or(ServiceError::NotFound("team member"))?;
        if member.role == TeamRole::Owner {
            return Err(ServiceError::invalid("the owner cannot leave the team"));
        }
        tx.delete_member(team_id, user)?;
        tx.commit()?;
        Ok(())
    }

    /// Removing yourself is the same as leaving and needs no manager role.
    pub fn remove_member(&self, team_id: Uuid, actor: Uuid, user: Uuid) -> ServiceResult<()> {
        if actor == user {
            return self.leave_team(team_id, user);
        }
        let tx = self.storage.begin_tx()?;
        require_team(&tx, team_id)?;
        let manager = require_manager(&tx, team_id, actor)?;
        let target = tx
            .load_member(team_id, user)?
            .ok_or(ServiceError::NotFound("team member"))?;
        match (manager.role, target.role) {
            (_, TeamRole::Owner) => {
                return Err(ServiceError::invalid("the owner cannot be removed"))
            }
            (TeamRole::Admin, TeamRole::Admin) => {
                return Err(ServiceError::forbidden("admins cannot remove other admins"))
            }
            _ => {}
        }
        tx.delete_member(team_id, user)?;
        tx.commit()?;
        Ok(())
    }

    pub fn set_member_role(
        &self,
        team_id: Uuid,
        actor: Uuid,
        user: Uuid,
        role: TeamRole,
    ) -> ServiceResult<TeamMember> {
        if role == TeamRole::Owner {
            return Err(ServiceError::invalid("role must be admin or member"));
        }
        let tx = self.storage.begin_tx()?;
        let team = require_team(&tx, team_id)?;
        if team.owner_id != actor {
            return Err(ServiceError::forbidden("only the team owner may change roles"));
        }
        let mut member = tx
            .load_member(team_id, user)?
            .ok_or(ServiceError::NotFound("team member"))?;
        if member.role == TeamRole::Owner {
            return Err(ServiceError::invalid("the owner's role cannot be changed"));
        }
        tx.update_member_role(team_id, user, role)?;
        tx.commit()?;
        member.role = role;
        Ok(member)
    }
}

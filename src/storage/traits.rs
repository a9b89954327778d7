use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{
    Block, Match, Message, MessageCursor, Notification, Profile, ProfileQuery, Report, ReputationEvent, Star,
    Swipe, Team, TeamApplication, TeamMember, TeamQuery,
};
use crate::types::{ApplicationStatus, ReputationAction, TeamRole};

pub trait ProfileStore {
    fn load_profile(&self, id: Uuid) -> Result<Option<Profile>>;
    fn load_profile_by_username(&self, username: &str) -> Result<Option<Profile>>;
    fn search_profiles(&self, query: &ProfileQuery) -> Result<Vec<Profile>>;
    /// Everyone `user` has not swiped yet, minus blocks in either direction.
    fn list_discover_candidates(&self, user: Uuid) -> Result<Vec<Profile>>;
    fn leaderboard(&self, college: Option<&str>, limit: u32) -> Result<Vec<Profile>>;
    fn insert_profile(&self, profile: &Profile) -> Result<()>;
    fn update_profile(&self, profile: &Profile) -> Result<()>;
}

pub trait MatchStore {
    fn load_swipe(&self, swiper: Uuid, target: Uuid) -> Result<Option<Swipe>>;
    fn insert_swipe(&self, swipe: &Swipe) -> Result<()>;
    fn load_match(&self, id: Uuid) -> Result<Option<Match>>;
    fn find_match_between(&self, first: Uuid, second: Uuid) -> Result<Option<Match>>;
    fn list_matches_for(&self, user: Uuid) -> Result<Vec<Match>>;
    fn insert_match(&self, m: &Match) -> Result<()>;
    /// Removes the match and its messages.
    fn delete_match(&self, id: Uuid) -> Result<()>;
}

pub trait ChatStore {
    fn insert_message(&self, message: &Message) -> Result<()>;
    /// Newest first, strictly after `before` in that order when given.
    fn list_messages(
        &self,
        match_id: Uuid,
        before: Option<MessageCursor>,
        limit: u32,
    ) -> Result<Vec<Message>>;
    fn last_message(&self, match_id: Uuid) -> Result<Option<Message>>;
    fn count_unread_in_match(&self, match_id: Uuid, reader: Uuid) -> Result<i64>;
    fn count_unread_messages(&self, reader: Uuid) -> Result<i64>;
    fn mark_messages_read(&self, match_id: Uuid, reader: Uuid, at: DateTime<Utc>)
        -> Result<usize>;
}

pub trait TeamStore {
    fn load_team(&self, id: Uuid) -> Result<Option<Team>>;
    fn list_teams(&self, query: &TeamQuery) -> Result<Vec<Team>>;
    fn insert_team(&self, team: &Team) -> Result<()>;
    fn update_team(&self, team: &Team) -> Result<()>;

    fn load_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<TeamMember>>;
    fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>>;
    fn list_memberships_for(&self, user_id: Uuid) -> Result<Vec<TeamMember>>;
    fn count_members(&self, team_id: Uuid) -> Result<u32>;
    fn insert_member(&self, member: &TeamMember) -> Result<()>;
    fn update_member_role(&self, team_id: Uuid, user_id: Uuid, role: TeamRole) -> Result<()>;
    fn delete_member(&self, team_id: Uuid, user_id: Uuid) -> Result<usize>;

    fn load_application(&self, id: Uuid) -> Result<Option<TeamApplication>>;
    fn find_pending_application(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamApplication>>;
    fn list_pending_applications(&self, team_id: Uuid) -> Result<Vec<TeamApplication>>;
    fn insert_application(&self, application: &TeamApplication) -> Result<()>;
    fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<()>;
    /// Pending applications to teams `user_id` owns or administers.
    fn count_pending_applications_managed_by(&self, user_id: Uuid) -> Result<i64>;
    fn count_pending_invites_for(&self, user_id: Uuid) -> Result<i64>;
}

pub trait NotificationStore {
    fn insert_notification(&self, notification: &Notification) -> Result<()>;
    fn load_notification(&self, id: Uuid) -> Result<Option<Notification>>;
    fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>>;
    fn mark_notification_read(&self, id: Uuid) -> Result<()>;
    fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<usize>;
    fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64>;
}

pub trait ReputationStore {
    fn insert_reputation_event(&self, event: &ReputationEvent) -> Result<()>;
    fn add_reputation(&self, user_id: Uuid, delta: i64) -> Result<()>;
    fn has_reputation_event(&self, user_id: Uuid, action: ReputationAction) -> Result<bool>;
    /// Sum of points from daily-capped actions recorded at or after `since`.
    fn sum_capped_points_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<i64>;
    fn list_reputation_events(&self, user_id: Uuid, limit: u32) -> Result<Vec<ReputationEvent>>;
}

pub trait CommunityStore {
    fn load_star(&self, giver: Uuid, receiver: Uuid) -> Result<Option<Star>>;
    fn insert_star(&self, star: &Star) -> Result<()>;
    fn delete_star(&self, giver: Uuid, receiver: Uuid) -> Result<usize>;
    fn list_stars_received(&self, receiver: Uuid, limit: u32) -> Result<Vec<Star>>;

    fn load_block(&self, blocker: Uuid, blocked: Uuid) -> Result<Option<Block>>;
    fn is_blocked_pair(&self, first: Uuid, second: Uuid) -> Result<bool>;
    fn insert_block(&self, block: &Block) -> Result<()>;
    fn delete_block(&self, blocker: Uuid, blocked: Uuid) -> Result<usize>;
    fn list_blocked_by(&self, blocker: Uuid) -> Result<Vec<Block>>;

    fn insert_report(&self, report: &Report) -> Result<()>;
}

/// A unit of work over every table. Dropping it without `commit` rolls back.
pub trait StorageTx:
    ProfileStore
    + MatchStore
    + ChatStore
    + TeamStore
    + NotificationStore
    + ReputationStore
    + CommunityStore
{
    fn commit(self) -> Result<()>;
}

pub trait Storage {
    type Tx: StorageTx;

    /// Opens a write transaction that holds the database write lock.
    fn begin_tx(&self) -> Result<Self::Tx>;
    /// Opens a read-only snapshot.
    fn begin_read(&self) -> Result<Self::Tx>;
}

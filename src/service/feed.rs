use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{clamp_limit, require_profile, Campus, ServiceError, ServiceResult};
use crate::{
    storage::{
        models::Notification, ChatStore, CommunityStore, MatchStore, NotificationStore,
        ReputationStore, Storage, StorageTx, TeamStore,
    },
    types::ReputationAction,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counts {
    pub unread_notifications: i64,
    pub unread_messages: i64,
    pub pending_applications: i64,
    pub pending_invites: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Matched,
    StarReceived,
    JoinedTeam,
    Reputation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub action: Option<ReputationAction>,
    pub points: Option<i64>,
}

impl ActivityItem {
    fn new(kind: ActivityKind, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            created_at,
            user_id: None,
            team_id: None,
            action: None,
            points: None,
        }
    }
}

impl<S: Storage> Campus<S> {
    pub fn notifications(
        &self,
        user: Uuid,
        unread_only: bool,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<Notification>> {
        let tx = self.storage.begin_read()?;
        require_profile(&tx, user)?;
        Ok(tx.list_notifications(user, unread_only, clamp_limit(limit, 50, 200))?)
    }

    /// Someone else's notification reads as missing.
    pub fn mark_notification_read(&self, id: Uuid, user: Uuid) -> ServiceResult<()> {
        let tx = self.storage.begin_tx()?;
        match tx.load_notification(id)? {
            Some(n) if n.user_id == user => {
                if !n.read {
                    tx.mark_notification_read(id)?;
                }
            }
            _ => return Err(ServiceError::NotFound("notification")),
        }
        tx.commit()?;
        Ok(())
    }

    pub fn mark_all_notifications_read(&self, user: Uuid) -> ServiceResult<usize> {
        let tx = self.storage.begin_tx()?;
        require_profile(&tx, user)?;
        let updated = tx.mark_all_notifications_read(user)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn counts(&self, user: Uuid) -> ServiceResult<Counts> {
        let tx = self.storage.begin_read()?;
        require_profile(&tx, user)?;
        Ok(Counts {
            unread_notifications: tx.count_unread_notifications(user)?,
            unread_messages: tx.count_unread_messages(user)?,
            pending_applications: tx.count_pending_applications_managed_by(user)?,
            pending_invites: tx.count_pending_invites_for(user)?,
        })
    }

    /// Newest-first merge of matches, stars received, team joins and
    /// reputation events.
    pub fn activity(&self, user: Uuid, limit: Option<u32>) -> ServiceResult<Vec<ActivityItem>> {
        let limit = clamp_limit(limit, 20, 100);
        let tx = self.storage.begin_read()?;
        require_profile(&tx, user)?;

        let mut items = Vec::new();
        for m in tx.list_matches_for(user)? {
            let mut item = ActivityItem::new(ActivityKind::Matched, m.created_at);
            item.user_id = m.other(user);
            items.push(item);
        }
        for star in tx.list_stars_received(user, limit)? {
            let mut item = ActivityItem::new(ActivityKind::StarReceived, star.created_at);
            item.user_id = Some(star.giver_id);
            items.push(item);
        }
        for membership in tx.list_memberships_for(user)? {
            let mut item = ActivityItem::new(ActivityKind::JoinedTeam, membership.joined_at);
            item.team_id = Some(membership.team_id);
            items.push(item);
        }
        for event in tx.list_reputation_events(user, limit)? {
            let mut item = ActivityItem::new(ActivityKind::Reputation, event.created_at);
            item.action = Some(event.action);
            item.points = Some(event.points);
            items.push(item);
        }

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }
}

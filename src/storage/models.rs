use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{
    ApplicationKind, ApplicationStatus, NotificationKind, ReportReason, ReputationAction,
    SwipeDirection, TeamRole,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub college: String,
    pub branch: Option<String>,
    pub year: Option<u8>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
    pub reputation: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileQuery {
    pub college: Option<String>,
    pub skill: Option<String>,
    pub text: Option<String>,
    pub limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Swipe {
    pub id: Uuid,
    pub swiper_id: Uuid,
    pub target_id: Uuid,
    pub direction: SwipeDirection,
    pub created_at: DateTime<Utc>,
}

/// A mutual like. Stored once per pair with `user_a < user_b`.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn between(id: Uuid, first: Uuid, second: Uuid, created_at: DateTime<Utc>) -> Self {
        let (user_a, user_b) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            id,
            user_a,
            user_b,
            created_at,
        }
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.user_a == user || self.user_b == user
    }

    pub fn other(&self, user: Uuid) -> Option<Uuid> {
        if self.user_a == user {
            Some(self.user_b)
        } else if self.user_b == user {
            Some(self.user_a)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Position in a conversation: messages older than `created_at`, or equal to
/// it and inserted before message `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageCursor {
    pub created_at: DateTime<Utc>,
    pub id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Team {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub max_members: u32,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct TeamQuery {
    pub open: Option<bool>,
    pub skill: Option<String>,
    pub limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TeamApplication {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub kind: ApplicationKind,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub invited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReputationEvent {
    pub user_id: Uuid,
    pub action: ReputationAction,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_between_orders_users() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let m = Match::between(Uuid::from_u128(9), high, low, Utc::now());
        assert_eq!(m.user_a, low);
        assert_eq!(m.user_b, high);
        assert_eq!(m.other(low), Some(high));
        assert_eq!(m.other(high), Some(low));
        assert_eq!(m.other(Uuid::from_u128(3)), None);
        assert!(!m.involves(Uuid::from_u128(3)));
    }
}

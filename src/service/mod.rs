//! Request-level operations. Each public method on [`Campus`] is one unit of
//! work: it opens a storage transaction, applies the rules, and commits.

mod chat;
mod community;
mod error;
mod feed;
mod matching;
mod profiles;
mod reputation;
mod teams;
mod validate;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    github::GithubClient,
    storage::{models::Notification, models::Profile, NotificationStore, ProfileStore, Storage},
    types::NotificationKind,
};

pub use chat::MessagePage;
pub use community::NewReport;
pub use error::{ServiceError, ServiceResult};
pub use feed::{ActivityItem, ActivityKind, Counts};
pub use matching::{MatchOverview, SwipeOutcome};
pub use profiles::{DiscoverCandidate, LeaderboardEntry, NewProfile, ProfilePatch};
pub use reputation::{ReputationPolicy, ReputationSummary, DEFAULT_DAILY_CAP};
pub use teams::{MemberView, NewTeam, TeamDetail, TeamPatch, TeamSummary};

#[derive(Clone)]
pub struct Campus<S: Storage> {
    storage: S,
    policy: ReputationPolicy,
    github: GithubClient,
}

impl<S: Storage> Campus<S> {
    pub fn new(storage: S, policy: ReputationPolicy, github: GithubClient) -> Self {
        Self {
            storage,
            policy,
            github,
        }
    }

    pub fn policy(&self) -> &ReputationPolicy {
        &self.policy
    }
}

pub(crate) fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max)
}

fn require_profile<T: ProfileStore + ?Sized>(tx: &T, id: Uuid) -> ServiceResult<Profile> {
    tx.load_profile(id)?.ok_or(ServiceError::NotFound("profile"))
}

fn notify<T: NotificationStore + ?Sized>(
    tx: &T,
    user_id: Uuid,
    kind: NotificationKind,
    actor_id: Option<Uuid>,
    subject_id: Option<Uuid>,
    body: String,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    tx.insert_notification(&Notification {
        id: Uuid::new_v4(),
        user_id,
        kind,
        actor_id,
        subject_id,
        body,
        read: false,
        created_at: now,
    })
}

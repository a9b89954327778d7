use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    service::{
        ActivityItem, ActivityKind, Counts, DiscoverCandidate, LeaderboardEntry, MatchOverview,
        MemberView, MessagePage, ReputationSummary, SwipeOutcome, TeamDetail, TeamSummary,
    },
    storage::models::{
        Message, MessageCursor, Notification, Profile, Report, ReputationEvent, Team,
        TeamApplication, TeamMember,
    },
    types::{
        ApplicationKind, ApplicationStatus, NotificationKind, ReportReason, ReputationAction,
        SwipeDirection, TeamRole,
    },
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UpdatedResponse {
    pub updated: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    pub actor_id: Uuid,
}

#[derive(Deserialize, Default)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

// profiles

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
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

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            username: p.username,
            full_name: p.full_name,
            college: p.college,
            branch: p.branch,
            year: p.year,
            bio: p.bio,
            skills: p.skills,
            interests: p.interests,
            github_username: p.github_username,
            linkedin_url: p.linkedin_url,
            avatar_url: p.avatar_url,
            reputation: p.reputation,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub username: String,
    pub full_name: String,
    pub college: String,
    pub branch: Option<String>,
    pub year: Option<u8>,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub college: Option<String>,
    pub branch: Option<String>,
    pub year: Option<u8>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub github_username: Option<String>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    pub college: Option<String>,
    pub skill: Option<String>,
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverResponse {
    pub profile: ProfileResponse,
    pub shared_skills: Vec<String>,
    pub shared_interests: Vec<String>,
    pub score: usize,
}

impl From<DiscoverCandidate> for DiscoverResponse {
    fn from(c: DiscoverCandidate) -> Self {
        Self {
            score: c.score(),
            profile: c.profile.into(),
            shared_skills: c.shared_skills,
            shared_interests: c.shared_interests,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
    pub college: Option<String>,
}

#[derive(Serialize)]
pub struct LeaderboardEntryResponse {
    pub rank: u32,
    pub profile: ProfileResponse,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            profile: e.profile.into(),
        }
    }
}

// swipes, matches, chat

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub swiper_id: Uuid,
    pub target_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub swipe_id: Uuid,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

impl From<SwipeOutcome> for SwipeResponse {
    fn from(o: SwipeOutcome) -> Self {
        Self {
            swipe_id: o.swipe_id,
            matched: o.matched,
            match_id: o.match_id,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            match_id: m.match_id,
            sender_id: m.sender_id,
            content: m.content,
            read_at: m.read_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub match_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub other: ProfileResponse,
    pub last_message: Option<MessageResponse>,
    pub unread_count: i64,
}

impl From<MatchOverview> for MatchResponse {
    fn from(m: MatchOverview) -> Self {
        Self {
            match_id: m.match_id,
            created_at: m.created_at,
            other: m.other.into(),
            last_message: m.last_message.map(Into::into),
            unread_count: m.unread,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub user_id: Uuid,
    pub before: Option<DateTime<Utc>>,
    /// Last message of the previous page; breaks ties on `before`.
    pub before_id: Option<Uuid>,
    pub limit: Option<u32>,
}

impl MessagesQuery {
    pub fn cursor(&self) -> Option<MessageCursor> {
        self.before.map(|created_at| MessageCursor {
            created_at,
            id: self.before_id,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageResponse {
    pub messages: Vec<MessageResponse>,
    pub next_before: Option<DateTime<Utc>>,
    pub next_before_id: Option<Uuid>,
}

impl From<MessagePage> for MessagePageResponse {
    fn from(page: MessagePage) -> Self {
        Self {
            messages: page.messages.into_iter().map(Into::into).collect(),
            next_before: page.next_before.map(|c| c.created_at),
            next_before_id: page.next_before.and_then(|c| c.id),
        }
    }
}

// teams

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub max_members: u32,
    pub is_open: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub actor_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub max_members: Option<u32>,
    pub is_open: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct TeamsQuery {
    pub open: Option<bool>,
    pub skill: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub max_members: u32,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(t: Team) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            name: t.name,
            description: t.description,
            required_skills: t.required_skills,
            max_members: t.max_members,
            is_open: t.is_open,
            created_at: t.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummaryResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub member_count: u32,
}

impl From<TeamSummary> for TeamSummaryResponse {
    fn from(s: TeamSummary) -> Self {
        Self {
            team: s.team.into(),
            member_count: s.member_count,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub profile: ProfileResponse,
}

impl From<MemberView> for MemberResponse {
    fn from(m: MemberView) -> Self {
        Self {
            user_id: m.member.user_id,
            role: m.member.role,
            joined_at: m.member.joined_at,
            profile: m.profile.into(),
        }
    }
}

#[derive(Serialize)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub members: Vec<MemberResponse>,
}

impl From<TeamDetail> for TeamDetailResponse {
    fn from(d: TeamDetail) -> Self {
        Self {
            team: d.team.into(),
            members: d.members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub user_id: Uuid,
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub actor_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub actor_id: Uuid,
    pub approve: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub actor_id: Uuid,
    pub role: TeamRole,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
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

impl From<TeamApplication> for ApplicationResponse {
    fn from(a: TeamApplication) -> Self {
        Self {
            id: a.id,
            team_id: a.team_id,
            user_id: a.user_id,
            kind: a.kind,
            status: a.status,
            message: a.message,
            invited_by: a.invited_by,
            created_at: a.created_at,
            responded_at: a.responded_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

impl From<TeamMember> for MembershipResponse {
    fn from(m: TeamMember) -> Self {
        Self {
            team_id: m.team_id,
            user_id: m.user_id,
            role: m.role,
            joined_at: m.joined_at,
        }
    }
}

// community

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarRequest {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarResponse {
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponse {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            reported_id: r.reported_id,
            reason: r.reason,
            details: r.details,
            created_at: r.created_at,
        }
    }
}

// notifications, counters, activity, reputation

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            actor_id: n.actor_id,
            subject_id: n.subject_id,
            body: n.body,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsResponse {
    pub unread_notifications: i64,
    pub unread_messages: i64,
    pub pending_applications: i64,
    pub pending_invites: i64,
}

impl From<Counts> for CountsResponse {
    fn from(c: Counts) -> Self {
        Self {
            unread_notifications: c.unread_notifications,
            unread_messages: c.unread_messages,
            pending_applications: c.pending_applications,
            pending_invites: c.pending_invites,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ReputationAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
}

impl From<ActivityItem> for ActivityResponse {
    fn from(i: ActivityItem) -> Self {
        Self {
            kind: i.kind,
            created_at: i.created_at,
            user_id: i.user_id,
            team_id: i.team_id,
            action: i.action,
            points: i.points,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationEventResponse {
    pub action: ReputationAction,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ReputationEvent> for ReputationEventResponse {
    fn from(e: ReputationEvent) -> Self {
        Self {
            action: e.action,
            points: e.points,
            created_at: e.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationResponse {
    pub reputation: i64,
    pub today_points: i64,
    pub daily_cap: i64,
    pub events: Vec<ReputationEventResponse>,
}

impl From<ReputationSummary> for ReputationResponse {
    fn from(s: ReputationSummary) -> Self {
        Self {
            reputation: s.reputation,
            today_points: s.today_points,
            daily_cap: s.daily_cap,
            events: s.events.into_iter().map(Into::into).collect(),
        }
    }
}

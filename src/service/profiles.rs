use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{clamp_limit, require_profile, validate, Campus, ServiceError, ServiceResult};
use crate::{
    storage::{
        models::{Profile, ProfileQuery},
        ProfileStore, Storage, StorageTx,
    },
    types::ReputationAction,
};

const MAX_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 500;
const MAX_SHORT_TEXT_LEN: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct NewProfile {
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
}

/// Fields left as `None` are kept. An empty string clears an optional field.
#[derive(Clone, Debug, Default)]
pub struct ProfilePatch {
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

#[derive(Clone, Debug)]
pub struct DiscoverCandidate {
    pub profile: Profile,
    pub shared_skills: Vec<String>,
    pub shared_interests: Vec<String>,
}

impl DiscoverCandidate {
    pub fn score(&self) -> usize {
        self.shared_skills.len() + self.shared_interests.len()
    }
}

#[derive(Clone, Debug)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub profile: Profile,
}

impl<S: Storage> Campus<S> {
    pub fn create_profile(&self, new: NewProfile, now: DateTime<Utc>) -> ServiceResult<Profile> {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: validate::username(&new.username)?,
            full_name: validate::required_text("fullName", &new.full_name, MAX_NAME_LEN)?,
            college: validate::required_text("college", &new.college, MAX_NAME_LEN)?,
            branch: validate::optional_text("branch", new.branch.as_deref(), MAX_SHORT_TEXT_LEN)?,
            year: validate::year(new.year)?,
            bio: validate::optional_text("bio", new.bio.as_deref(), MAX_BIO_LEN)?,
            skills: validate::tag_list("skills", &new.skills)?,
            interests: validate::tag_list("interests", &new.interests)?,
            github_username: validate::github_username(new.github_username.as_deref())?,
            linkedin_url: validate::http_url("linkedinUrl", new.linkedin_url.as_deref())?,
            avatar_url: validate::http_url("avatarUrl", new.avatar_url.as_deref())?,
            reputation: 0,
            created_at: now,
            updated_at: now,
        };

        let tx = self.storage.begin_tx()?;
        if tx.load_profile_by_username(&profile.username)?.is_some() {
            return Err(ServiceError::conflict("username already taken"));
        }
        tx.insert_profile(&profile)?;
        self.reward_new_links(&tx, None, &profile, now)?;
        let stored = require_profile(&tx, profile.id)?;
        tx.commit()?;

        log::info!("👤 profile created: {} ({})", stored.username, stored.id);
        Ok(stored)
    }

    pub fn get_profile(&self, id: Uuid) -> ServiceResult<Profile> {
        let tx = self.storage.begin_read()?;
        require_profile(&tx, id)
    }

    pub fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
        now: DateTime<Utc>,
    ) -> ServiceResult<Profile> {
        let tx = self.storage.begin_tx()?;
        let before = require_profile(&tx, id)?;
        let mut after = before.clone();

        if let Some(full_name) = patch.full_name {
            after.full_name = validate::required_text("fullName", &full_name, MAX_NAME_LEN)?;
        }
        if let Some(college) = patch.college {
            after.college = validate::required_text("college", &college, MAX_NAME_LEN)?;
        }
        if let Some(branch) = patch.branch {
            after.branch = validate::optional_text("branch", Some(&branch), MAX_SHORT_TEXT_LEN)?;
        }
        if patch.year.is_some() {
            after.year = validate::year(patch.year)?;
        }
        if let Some(bio) = patch.bio {
            after.bio = validate::optional_text("bio", Some(&bio), MAX_BIO_LEN)?;
        }
        if let Some(skills) = patch.skills {
            after.skills = validate::tag_list("skills", &skills)?;
        }
        if let Some(interests) = patch.interests {
            after.interests = validate::tag_list("interests", &interests)?;
        }
        if let Some(login) = patch.github_username {
            after.github_username = validate::github_username(Some(&login))?;
        }
        if let Some(url) = patch.linkedin_url {
            after.linkedin_url = validate::http_url("linkedinUrl", Some(&url))?;
        }
        if let Some(url) = patch.avatar_url {
            after.avatar_url = validate::http_url("avatarUrl", Some(&url))?;
        }
        after.updated_at = now;

        tx.update_profile(&after)?;
        self.reward_new_links(&tx, Some(&before), &after, now)?;
        let stored = require_profile(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    pub fn search_profiles(&self, mut query: ProfileQuery) -> ServiceResult<Vec<Profile>> {
        query.limit = clamp_limit(Some(query.limit), 20, 100);
        query.college = query.college.filter(|c| !c.trim().is_empty());
        query.skill = query.skill.filter(|s| !s.trim().is_empty());
        query.text = query.text.filter(|t| !t.trim().is_empty());
        let tx = self.storage.begin_read()?;
        Ok(tx.search_profiles(&query)?)
    }

    pub fn discover(&self, user: Uuid, limit: Option<u32>) -> ServiceResult<Vec<DiscoverCandidate>> {
        let limit = clamp_limit(limit, 20, 100) as usize;
        let tx = self.storage.begin_read()?;
        let me = require_profile(&tx, user)?;
        let my_skills = lowercase_set(&me.skills);
        let my_interests = lowercase_set(&me.interests);

        let mut candidates: Vec<DiscoverCandidate> = tx
            .list_discover_candidates(user)?
            .into_iter()
            .map(|profile| DiscoverCandidate {
                shared_skills: shared(&profile.skills, &my_skills),
                shared_interests: shared(&profile.interests, &my_interests),
                profile,
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| b.profile.reputation.cmp(&a.profile.reputation))
                .then_with(|| a.profile.username.cmp(&b.profile.username))
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Competition ranking: equal reputation shares a rank, the next rank
    /// skips accordingly (1, 1, 3).
    pub fn leaderboard(
        &self,
        college: Option<&str>,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<LeaderboardEntry>> {
        let limit = clamp_limit(limit, 10, 100);
        let tx = self.storage.begin_read()?;
        let profiles = tx.leaderboard(college.filter(|c| !c.trim().is_empty()), limit)?;

        let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(profiles.len());
        for (idx, profile) in profiles.into_iter().enumerate() {
            let rank = match entries.last() {
                Some(prev) if prev.profile.reputation == profile.reputation => prev.rank,
                _ => idx as u32 + 1,
            };
            entries.push(LeaderboardEntry { rank, profile });
        }
        Ok(entries)
    }

    pub async fn github_stats(&self, id: Uuid) -> ServiceResult<crate::github::GithubStats> {
        let profile = self.get_profile(id)?;
        let login = profile
            .github_username
            .ok_or_else(|| ServiceError::invalid("profile has no github username"))?;
        self.github.fetch_stats(&login).await.map_err(Into::into)
    }

    fn reward_new_links<T: StorageTx>(
        &self,
        tx: &T,
        before: Option<&Profile>,
        after: &Profile,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let had_github = before.is_some_and(|p| p.github_username.is_some());
        if !had_github && after.github_username.is_some() {
            self.policy
                .grant(tx, after.id, ReputationAction::LinkGithub, now)?;
        }
        let had_linkedin = before.is_some_and(|p| p.linkedin_url.is_some());
        if !had_linkedin && after.linkedin_url.is_some() {
            self.policy
                .grant(tx, after.id, ReputationAction::LinkLinkedin, now)?;
        }
        Ok(())
    }
}

fn lowercase_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn shared(values: &[String], mine: &HashSet<String>) -> Vec<String> {
    values
        .iter()
        .filter(|v| mine.contains(&v.to_lowercase()))
        .cloned()
        .collect()
}

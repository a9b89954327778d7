//! Read-only client for the GitHub REST API, used to show coding statistics on
//! profiles.

use std::{collections::HashMap, time::Duration};

use anyhow::Context;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::ServiceError;

const USER_AGENT: &str = concat!("campusmatch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOP_LANGUAGES: usize = 5;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github user not found")]
    NotFound,
    #[error("github api answered {0}")]
    Status(StatusCode),
    #[error("github request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl From<GithubError> for ServiceError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::NotFound => ServiceError::NotFound("github user"),
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubStats {
    pub login: String,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub total_stars: u64,
    pub top_languages: Vec<String>,
    pub profile_url: String,
}

#[derive(Deserialize)]
struct UserPayload {
    login: String,
    #[serde(default)]
    public_repos: u32,
    #[serde(default)]
    followers: u32,
    #[serde(default)]
    following: u32,
    html_url: String,
}

#[derive(Deserialize)]
struct RepoPayload {
    #[serde(default)]
    stargazers_count: u64,
    language: Option<String>,
    #[serde(default)]
    fork: bool,
}

#[derive(Clone, Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building github http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub async fn fetch_stats(&self, login: &str) -> Result<GithubStats, GithubError> {
        let user: UserPayload = self.get(&format!("/users/{login}")).await?;
        let repos: Vec<RepoPayload> = self
            .get(&format!("/users/{login}/repos?per_page=100&sort=updated"))
            .await?;
        log::debug!("github {}: {} repos fetched", login, repos.len());

        Ok(GithubStats {
            login: user.login,
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            total_stars: repos
                .iter()
                .filter(|r| !r.fork)
                .map(|r| r.stargazers_count)
                .sum(),
            top_languages: top_languages(&repos),
            profile_url: user.html_url,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, GithubError> {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(GithubError::NotFound),
            status if !status.is_success() => {
                log::warn!("github {} answered {}", path, status);
                Err(GithubError::Status(status))
            }
            _ => Ok(response.json().await?),
        }
    }
}

/// Most used languages across non-fork repos, ties broken by name.
fn top_languages(repos: &[RepoPayload]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for lang in repos
        .iter()
        .filter(|r| !r.fork)
        .filter_map(|r| r.language.as_deref())
    {
        *counts.entry(lang).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(lang, _)| lang.to_string())
        .collect()
}

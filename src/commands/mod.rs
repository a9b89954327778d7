use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use crate::{
    cli::{Command, ProfileCmd},
    rest::models::{LeaderboardEntryResponse, ProfileResponse},
    service::Campus,
    storage::Storage,
    types::ReputationAction,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AwardOutput {
    id: uuid::Uuid,
    action: ReputationAction,
    granted: i64,
    reputation: i64,
}

impl Command {
    /// Runs a one-shot command and writes its JSON result to `out`.
    pub fn run<S: Storage>(&self, campus: &Campus<S>, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Command::Leaderboard { limit, college } => {
                let entries: Vec<LeaderboardEntryResponse> = campus
                    .leaderboard(college.as_deref(), *limit)?
                    .into_iter()
                    .map(Into::into)
                    .collect();
                print_json(out, &entries)
            }
            Command::Profile { cmd } => cmd.run(campus, out),
        }
    }
}

impl ProfileCmd {
    fn run<S: Storage>(&self, campus: &Campus<S>, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            ProfileCmd::Show { id } => {
                let profile = campus.get_profile(*id)?;
                print_json(out, &ProfileResponse::from(profile))
            }
            ProfileCmd::Award { id, action } => {
                let granted = campus.award(*id, *action, Utc::now())?;
                let reputation = campus.get_profile(*id)?.reputation;
                log::info!("🏅 {} for {}: +{}", action, id, granted);
                print_json(
                    out,
                    &AwardOutput {
                        id: *id,
                        action: *action,
                        granted,
                        reputation,
                    },
                )
            }
        }
    }
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

use clap::Parser;
use std::env;

use crate::cli::command::Command;
use crate::service::DEFAULT_DAILY_CAP;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Campus networking service: profiles, matching, chat, teams and reputation",
    long_about = "Runs the campusmatch REST API on top of a local SQLite database. \
                  Subcommands run one-shot administrative tasks against the same database.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        env = "CAMPUSMATCH_DATA_DIR",
        default_value = ".campusmatch/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long = "log-file",
        env = "CAMPUSMATCH_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[arg(
        long = "api-listen",
        env = "CAMPUSMATCH_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:8080",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "github-api-url",
        env = "GITHUB_API_URL",
        value_name = "URL",
        default_value = "https://api.github.com",
        help = "Base URL of the GitHub REST API"
    )]
    pub github_api_url: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Optional GitHub token, sent as a bearer token"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "daily-reputation-cap",
        env = "CAMPUSMATCH_DAILY_REPUTATION_CAP",
        value_name = "POINTS",
        default_value_t = DEFAULT_DAILY_CAP,
        help = "Maximum capped reputation points a user can earn per UTC day"
    )]
    pub daily_reputation_cap: i64,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    if dotenvy::from_filename(&dotenv_path).is_ok() {
        log::debug!("loaded env from {}", dotenv_path);
    }
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Command, ProfileCmd};
    use crate::types::ReputationAction;

    #[test]
    fn defaults_apply_without_arguments() {
        let cli = Cli::try_parse_from(["campusmatch"]).unwrap();
        assert_eq!(cli.api_listen.to_string(), "127.0.0.1:8080");
        assert_eq!(cli.daily_reputation_cap, 50);
        assert!(!cli.reset);
        assert!(cli.cmd.is_none());
    }

    #[test]
    fn profile_award_parses_action() {
        let id = uuid::Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "campusmatch",
            "--data-dir",
            "/tmp/x",
            "profile",
            "award",
            "--id",
            &id.to_string(),
            "--action",
            "star_received",
        ])
        .unwrap();
        match cli.cmd {
            Some(Command::Profile {
                cmd: ProfileCmd::Award { id: parsed, action },
            }) => {
                assert_eq!(parsed, id);
                assert_eq!(action, ReputationAction::StarReceived);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = Cli::try_parse_from([
            "campusmatch",
            "profile",
            "award",
            "--id",
            &uuid::Uuid::new_v4().to_string(),
            "--action",
            "bribe",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("bribe"));
    }
}

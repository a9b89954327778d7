use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use url::Url;

/// Runtime settings resolved from the command line and environment.
#[derive(Clone, Debug)]
pub struct Context {
    pub data_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
    pub github_api_url: Url,
    pub github_token: Option<String>,
    pub daily_reputation_cap: i64,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> anyhow::Result<Self> {
        let github_api_url = Url::parse(&cli.github_api_url)
            .with_context(|| format!("invalid --github-api-url {:?}", cli.github_api_url))?;
        if cli.daily_reputation_cap < 0 {
            anyhow::bail!("--daily-reputation-cap must not be negative");
        }
        Ok(Self {
            data_dir: PathBuf::from(&cli.data_dir),
            api_listen: cli.api_listen,
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
            github_api_url,
            github_token: cli.github_token.clone(),
            daily_reputation_cap: cli.daily_reputation_cap,
        })
    }
}

use crate::{cli, context, github::GithubClient, logging, rest, service, storage};
use anyhow::{Context as AnyhowContext, Result};
use std::path::Path;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Process-wide state shared by the daemon and one-shot commands.
pub struct App<S: storage::Storage = storage::SqliteStorage> {
    config: context::Context,
    campus: service::Campus<S>,
    shutdown: CancellationToken,
}

impl App {
    /// Builds the app from CLI arguments: log file, storage and the GitHub client.
    pub fn from_cli() -> Result<(App, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli)?;

        logging::set_log_file(ctx.log_file.as_deref())?;
        log_startup_info(&ctx);

        let storage = init_storage(&ctx.data_dir, ctx.reset)?;
        let github = GithubClient::new(ctx.github_api_url.as_str(), ctx.github_token.clone())?;
        let policy = service::ReputationPolicy {
            daily_cap: ctx.daily_reputation_cap,
        };
        let campus = service::Campus::new(storage, policy, github);

        Ok((App::new(ctx, campus), cli))
    }
}

impl<S: storage::Storage + Clone + Send + Sync + 'static> App<S> {
    fn new(config: context::Context, campus: service::Campus<S>) -> Self {
        Self {
            config,
            campus,
            shutdown: CancellationToken::new(),
        }
    }

    /// Serves the REST API until Ctrl-C or until the server task dies.
    pub async fn run_daemon(&mut self) -> Result<()> {
        self.log_runtime_config();
        let mut rest_handle = self.spawn_rest_server();
        self.wait_for_shutdown(&mut rest_handle).await
    }

    fn spawn_rest_server(&self) -> JoinHandle<()> {
        let addr = self.config.api_listen;
        let campus = self.campus.clone();
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = rest::serve(addr, campus, token).await {
                log::error!("REST server failed: {:#}", e);
            }
        })
    }

    async fn wait_for_shutdown(&self, rest_task: &mut JoinHandle<()>) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::info!("🧨 Ctrl-C received, shutting down..."),
            _ = &mut *rest_task => log::error!("REST task exited unexpectedly"),
        }

        self.shutdown.cancel();

        // polling a completed JoinHandle again panics
        if !rest_task.is_finished() {
            let _ = rest_task.await;
        }

        log::info!("✅ Shutdown complete");
        Ok(())
    }

    fn log_runtime_config(&self) {
        log::info!("🌐 REST API: http://{}", self.config.api_listen);
        log::info!(
            "🏅 Daily reputation cap: {}",
            self.config.daily_reputation_cap
        );
        if let Some(path) = self.config.log_file.as_deref() {
            log::info!("📝 Log file: {}", path.to_string_lossy());
        }
    }
}

fn log_startup_info(ctx: &context::Context) {
    log::info!("🚀 Starting campusmatch");
    log::info!("🐙 GitHub API: {}", ctx.github_api_url);
    log::info!(
        "🔐 GitHub auth: {}",
        if ctx.github_token.is_some() {
            "token"
        } else {
            "anonymous"
        }
    );
    log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
}

fn init_storage(data_dir: &Path, reset: bool) -> Result<storage::SqliteStorage> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let sqlite = storage::SqliteStorage::new(data_dir.join("campusmatch.sqlite"));
    if reset {
        log::warn!("🧹 Resetting storage");
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}

pub async fn run() -> Result<()> {
    let (mut app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        return cmd.run(&app.campus, &mut std::io::stdout().lock());
    }

    app.run_daemon().await
}

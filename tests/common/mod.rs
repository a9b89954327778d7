#![allow(dead_code)]

use std::net::TcpListener;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

pub fn base_cmd(data_dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_campusmatch"));
    command
        .env("DOTENV_PATH", data_dir.path().join("missing.env"))
        .env_remove("GITHUB_TOKEN")
        .env_remove("CAMPUSMATCH_DAILY_REPUTATION_CAP")
        .env("RUST_LOG", "warn")
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--github-api-url")
        .arg("http://127.0.0.1:9");
    command
}

/// Runs a one-shot subcommand and parses its stdout as JSON.
pub fn run_json(data_dir: &TempDir, args: &[&str]) -> Value {
    let output = base_cmd(data_dir).args(args).output().expect("run campusmatch");
    assert_success(&output, args);
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

pub fn assert_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "campusmatch {:?} failed\nstdout:\n{}\nstderr:\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

/// A daemon child process, killed on drop.
pub struct Daemon {
    child: Child,
    pub base_url: String,
}

impl Daemon {
    pub async fn start(data_dir: &TempDir) -> Self {
        let port = free_port();
        let child = base_cmd(data_dir)
            .arg("--api-listen")
            .arg(format!("127.0.0.1:{port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn daemon");
        let daemon = Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
        };
        daemon.wait_ready().await;
        daemon
    }

    async fn wait_ready(&self) {
        let client = reqwest::Client::new();
        for _ in 0..100 {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("daemon at {} never became healthy", self.base_url);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

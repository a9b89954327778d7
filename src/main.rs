mod app;
mod cli;
mod commands;
mod context;
mod github;
mod logging;
mod rest;
mod service;
mod storage;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    app::run().await
}

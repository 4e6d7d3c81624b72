use anyhow::Context;
use cairn_server::{app, AppState, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr;
    let state = AppState::new(config);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    log::info!("cairn-server {VERSION} listening on {bind_addr}");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}

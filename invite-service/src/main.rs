use anyhow::Context;
use log::info;
use referral_shared::auth::AuthKeys;
use referral_shared::invite_store::InviteTokenStore;
use referral_shared::store::memory::MemoryUserStore;
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod state;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Invite Service");

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let invites = Arc::new(
        InviteTokenStore::new(config.invite.clone()).context("Invalid invite token settings")?,
    );
    let sweeper = InviteTokenStore::spawn_sweeper(invites.clone());
    info!(
        "Invite tokens live for {}h, swept every {}s",
        config.invite.lifetime.num_hours(),
        config.invite.sweep_interval.as_secs()
    );

    let users = Arc::new(MemoryUserStore::new());
    let state = AppState::new(users, invites, config.bcrypt_cost);
    let auth_keys = AuthKeys::from_secret(config.jwt_secret.as_bytes());
    let app = routes::create_router_with_state(state, auth_keys, &config.prefix);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.shutdown().await;
    info!("Invite Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, never resolve; the process is stopped externally
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

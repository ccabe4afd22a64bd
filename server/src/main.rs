use analysis::{Drafter, OpenAiChatModel};
use config::Config;
use notify::{Dispatcher, Notifier, SlackTransport, SmtpTransport};
use scribe_core::Channel;
use std::sync::Arc;
use storage::{GitBackend, RepositoryTracker, SqliteStore};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use scribe::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Starting {}", config.server.app_name);

    let store = SqliteStore::connect(&config.storage.database_url).await?;
    store.initialize_schema().await?;

    let tracker = Arc::new(RepositoryTracker::new(
        Arc::new(store),
        Arc::new(GitBackend::new()),
        &config.storage.clone_path
    ));

    let model = OpenAiChatModel::new(
        &config.llm.api_key,
        &config.llm.model,
        &config.llm.base_url,
        config.llm.temperature
    )?;
    let drafter = Arc::new(Drafter::new(Arc::new(model)));

    let email = Arc::new(SmtpTransport::from_config(&config.email)?);
    let mut dispatcher = Dispatcher::new().with_transport(Channel::Email, email);
    match SlackTransport::from_config(&config.chat)? {
        Some(slack) => dispatcher = dispatcher.with_transport(Channel::Chat, Arc::new(slack)),
        None => warn!("Chat notifications disabled")
    }

    let state = AppState::new(
        tracker,
        drafter,
        Notifier::new(dispatcher),
        config.scan.max_drafts_per_scan
    );
    let queue = state.queue.clone();
    let app = create_router(state);

    let addr = config.server.socket_addr()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waiting for background jobs");
    queue.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}

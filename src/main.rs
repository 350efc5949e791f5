use dotenvy::dotenv;
use impulse_pause::{
    app::App,
    config::{AppConfig, database},
    errors::{Error, Result},
    notify::{Dispatcher, NtfyNotifier},
    scheduler,
    store::{MemoryStore, SqliteStore, WaitlistStore},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env before anything reads the environment
    dotenv().ok();

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 3. Load configuration
    let config = AppConfig::load()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        dashboard_url = %config.dashboard_url,
        interval_secs = config.promotion_interval_secs,
        "configuration loaded"
    );

    // 4. Open the store
    let store: Arc<dyn WaitlistStore> = match &config.database_url {
        Some(url) => {
            let db = database::connect_and_migrate(url)
                .await
                .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
            Arc::new(SqliteStore::new(db))
        }
        None => {
            warn!("DATABASE_URL not set; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // 5. Build the core and start the promotion loop
    let notifier = NtfyNotifier::new().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    let dispatcher = Dispatcher::new(Arc::new(notifier), config.dashboard_url.clone());
    let app = Arc::new(App::new(store, dispatcher, &config.default_profile).await?);
    let promoter = scheduler::spawn_promotion_loop(Arc::clone(&app), config.promotion_interval());

    // 6. Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    promoter.abort();

    Ok(())
}

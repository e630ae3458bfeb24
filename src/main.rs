use std::net::SocketAddr;
use std::sync::Arc;

use early_access_server::{
    build_router,
    config::StorageKind,
    db::{create_pool, MemoryStore, PgStore, SignupStore},
    AppState, Config, GeoResolver, Mailer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "early_access_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Early Access Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    let store: Arc<dyn SignupStore> = match config.storage {
        StorageKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let store = PgStore::new(create_pool(database_url).await?);

            tracing::info!("Running database migrations...");
            store.migrate().await?;
            tracing::info!("Migrations complete");

            Arc::new(store)
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer = Mailer::from_config(&config.email)?;
    if config.email.test_mode {
        tracing::info!("Email test mode on, all mail goes to the sandbox inbox");
    }
    if config.admin.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, admin routes are open");
    }

    let geo = GeoResolver::new(config.geo.clone())?;
    let addr: SocketAddr = config.server_address().parse()?;

    let app = build_router(AppState::new(store, mailer, geo, config));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

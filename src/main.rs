use roompresence::{
    build_router,
    channel::{ChannelBackend, InMemoryChannelBackend},
    config::ServerConfig,
    event::EventBus,
    room::repository::{
        InMemoryRoomRecordRepository, PostgresRoomRecordRepository, RoomRecordRepository,
    },
    shared::AppState,
    start_room_lifecycle,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roompresence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    info!(
        bind_addr = %config.bind_addr,
        event_bus_capacity = config.event_bus_capacity,
        atomic_visibility = config.atomic_visibility,
        "Starting room presence server"
    );

    let channel_backend: Arc<dyn ChannelBackend> = Arc::new(
        InMemoryChannelBackend::with_atomic_visibility(config.atomic_visibility),
    );

    let room_repository: Arc<dyn RoomRecordRepository + Send + Sync> = match &config.database_url
    {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresRoomRecordRepository::new(pool);
            repository.ensure_schema().await?;
            info!("Using PostgreSQL room record storage");
            Arc::new(repository)
        }
        None => {
            info!("Using in-memory room record storage");
            Arc::new(InMemoryRoomRecordRepository::new())
        }
    };

    let event_bus = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::new(channel_backend, room_repository, event_bus);

    // Room lifecycle runs off channel-left events, not off requests
    let _lifecycle_task = start_room_lifecycle(&app_state);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

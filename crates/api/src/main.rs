use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kontrol_api::config::ServerConfig;
use kontrol_api::notifications::OrganizationAdmins;
use kontrol_api::router::build_app_router;
use kontrol_api::state::AppState;
use kontrol_core::export::CsvReportExporter;
use kontrol_core::photos::LocalPhotoStorage;
use kontrol_db::PgInspectionStore;
use kontrol_events::{EmailConfig, EmailDelivery, EventBus, NotificationDispatcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kontrol_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = kontrol_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    kontrol_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    kontrol_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus and notifications ---
    let event_bus = Arc::new(EventBus::default());
    let email = EmailConfig::from_env().map(EmailDelivery::new);
    if email.is_none() {
        tracing::info!("SMTP_HOST not set, notifications will be logged only");
    }
    let dispatcher = NotificationDispatcher::new(email)
        .with_directory(Arc::new(OrganizationAdmins::new(pool.clone())));
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // --- Collaborators ---
    tokio::fs::create_dir_all(&config.photo_storage_dir)
        .await
        .expect("Failed to create photo storage directory");
    let photos = LocalPhotoStorage::new(&config.photo_storage_dir, config.max_photo_bytes);

    // --- App state ---
    let state = AppState {
        store: Arc::new(PgInspectionStore::new(pool.clone())),
        pool,
        config: Arc::new(config.clone()),
        photos: Arc::new(photos),
        exporter: Arc::new(CsvReportExporter),
        event_bus: Arc::clone(&event_bus),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Dropping the last sender closes the channel and stops the dispatcher.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

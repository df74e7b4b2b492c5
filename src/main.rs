use anyhow::Context;
use notification_center::{
    db::{create_pool, run_migrations},
    notification::{DatabaseTarget, MessageCatalog, NotificationManager},
    routes::create_router,
    state::{AppState, Config},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notification_center=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let catalog = match &config.notification_types_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading notification types from {}", path))?;
            MessageCatalog::from_json(&raw)
                .with_context(|| format!("parsing notification types in {}", path))?
        }
        None => MessageCatalog::default(),
    };
    tracing::info!("Loaded {} notification types", catalog.len());

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    let target =
        DatabaseTarget::new(db, Arc::new(catalog)).with_table(&config.notification_table)?;
    let state = AppState {
        config: config.clone(),
        notification_manager: NotificationManager::new(Arc::new(target)),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

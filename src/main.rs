use anyhow::Context;
use std::sync::Arc;
use traidenis::bootstrap;
use traidenis::config::Config;
use traidenis::domain::ports::template_repository::TemplateRepository;
use traidenis::infrastructure::http::router::build_router;
use traidenis::infrastructure::observability;
use traidenis::infrastructure::persistence::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let _observability = observability::init(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize observability: {}", e))?;
    tracing::info!("Configuration loaded");

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection established");

    db.run_migrations()
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let template_repo: Arc<dyn TemplateRepository> = Arc::new(db);
    let state = bootstrap::build_app_state(template_repo, &config).await;

    let app = build_router(state);

    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

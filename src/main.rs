use std::sync::Arc;
use tippspiel::{
    build_router, AppConfig, AppState, InMemoryRoundRepository, PostgresRoundRepository,
    RoundRepository,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tippspiel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting guessing game server");

    let config = AppConfig::from_env();

    let round_repository: Arc<dyn RoundRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .expect("Failed to connect to database");
            let repository = PostgresRoundRepository::new(pool);
            repository
                .ensure_schema()
                .await
                .expect("Failed to prepare round tables");
            info!("Using PostgreSQL round store");
            Arc::new(repository)
        }
        None => {
            warn!("DATABASE_URL not set, rounds are kept in memory only");
            Arc::new(InMemoryRoundRepository::new())
        }
    };

    if config.admin_password.is_none() {
        warn!("ADMIN_PASSWORD not set, round submission and deletion are unprotected");
    }

    let app_state = AppState::new(
        round_repository,
        config.season_clock,
        config.admin_password.clone(),
    );
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind listener");
    info!(address = %config.bind_address, "Server running");
    axum::serve(listener, app).await.expect("Server error");
}
